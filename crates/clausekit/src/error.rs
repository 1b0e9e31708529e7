//! Error types for clausekit

use crate::diagnostics::Diagnostic;
use thiserror::Error;

/// Result type alias for clausekit operations
pub type ClauseResult<T> = Result<T, ClauseError>;

/// Errors raised while building, coercing or compiling SQL constructs.
#[derive(Debug, Error)]
pub enum ClauseError {
    /// A node was built with structurally invalid arguments.
    #[error("Construction error: {0}")]
    Construction(String),

    /// A value could not be coerced into the node kind a role requires.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// The tree could not be rendered by the active dialect.
    #[error("Compile error: {0}")]
    Compile(String),

    /// A deprecated or implicit conversion was rejected by policy.
    #[error("Rejected implicit coercion: {}", .0.message)]
    Deprecated(Diagnostic),
}

impl ClauseError {
    /// Create a construction error
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction(message.into())
    }

    /// Create a compile error
    pub fn compile(message: impl Into<String>) -> Self {
        Self::Compile(message.into())
    }

    /// Check if this is a construction error
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::Construction(_))
    }

    /// Check if this is a coercion (argument) error
    pub fn is_argument(&self) -> bool {
        matches!(self, Self::Argument(_))
    }

    /// Check if this is a compile error
    pub fn is_compile(&self) -> bool {
        matches!(self, Self::Compile(_))
    }

    /// The argument error, if this is one.
    pub fn as_argument(&self) -> Option<&ArgumentError> {
        match self {
            Self::Argument(err) => Some(err),
            _ => None,
        }
    }
}

/// A value could not be resolved to a valid node under the required role.
///
/// The message names the role and the offending value; `advice` carries a
/// remediation hint when one applies (e.g. "use the .subquery() method").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ArgumentError {
    message: String,
    /// Display name of the role that was required.
    pub role: &'static str,
    /// Representation of the value the caller supplied.
    pub value: String,
    /// Argument name at the consumption site, if known.
    pub argname: Option<String>,
    /// Remediation hint.
    pub advice: Option<String>,
    /// Stable short code identifying the failure class.
    pub code: Option<&'static str>,
}

impl ArgumentError {
    /// Build the standard "<role> expected, got <value>." error.
    pub(crate) fn expected(
        role: &'static str,
        value: String,
        argname: Option<&str>,
        resolved: Option<String>,
        advice: Option<String>,
        code: Option<&'static str>,
    ) -> Self {
        let got = match &resolved {
            Some(resolved) => format!("{resolved} object resolved from {value} object"),
            None => value.clone(),
        };
        let mut message = match argname {
            Some(arg) => format!("{role} expected for argument '{arg}'; got {got}."),
            None => format!("{role} expected, got {got}."),
        };
        if let Some(advice) = &advice {
            message.push(' ');
            message.push_str(advice);
        }
        Self {
            message,
            role,
            value,
            argname: argname.map(str::to_string),
            advice,
            code,
        }
    }

    /// Build an error with a fully custom message (textual SQL rejections).
    pub(crate) fn with_message(
        role: &'static str,
        value: String,
        argname: Option<&str>,
        message: String,
    ) -> Self {
        Self {
            message,
            role,
            value,
            argname: argname.map(str::to_string),
            advice: None,
            code: None,
        }
    }

    /// The full error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}
