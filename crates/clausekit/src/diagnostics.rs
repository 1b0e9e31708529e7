//! Non-fatal diagnostics raised by implicit or deprecated coercions.
//!
//! Diagnostics never replace a result: they are returned next to it
//! (see [`Coercion`](crate::coercion::Coercion) and
//! [`Compiled`](crate::compiler::Compiled)) and, with the `tracing` feature,
//! logged under the `clausekit.coercion` target.

use serde::Serialize;
use std::fmt;

/// Kind of diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// A backward-compatibility path that callers should migrate away from.
    Deprecated,
    /// A value was silently promoted into a different construct.
    ImplicitCoercion,
}

/// A warning emitted alongside a successful coercion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Display name of the role whose coercion raised it.
    pub role: &'static str,
}

impl Diagnostic {
    pub fn deprecated(role: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Deprecated,
            message: message.into(),
            role,
        }
    }

    pub fn implicit(role: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::ImplicitCoercion,
            message: message.into(),
            role,
        }
    }

    pub fn is_deprecation(&self) -> bool {
        self.kind == DiagnosticKind::Deprecated
    }

    pub(crate) fn log(&self) {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            target: "clausekit.coercion",
            kind = ?self.kind,
            role = self.role,
            "{}",
            self.message,
        );
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.role)
    }
}

/// What to do when a role has to convert a value implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImplicitPolicy {
    /// Convert and record a diagnostic.
    #[default]
    Warn,
    /// Refuse the conversion with [`ClauseError::Deprecated`](crate::ClauseError::Deprecated).
    Error,
    /// Convert without a diagnostic.
    Silent,
}
