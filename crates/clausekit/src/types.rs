//! Semantic SQL type tags carried by nodes.

use crate::value::BindValue;
use serde::Serialize;

/// The SQL type an expression evaluates to.
///
/// `Null` is the "unknown" tag: bind parameters built from `None`, or from
/// values whose type could not be inferred, carry it until a comparison
/// retypes them against the other operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SqlType {
    #[default]
    Null,
    Integer,
    Float,
    String,
    Boolean,
    DateTime,
    Uuid,
    Json,
}

impl SqlType {
    /// Infer the tag for a bound value.
    pub fn infer(value: &BindValue) -> Self {
        match value {
            BindValue::Null => SqlType::Null,
            BindValue::Bool(_) => SqlType::Boolean,
            BindValue::Int(_) => SqlType::Integer,
            BindValue::Float(_) => SqlType::Float,
            BindValue::Text(_) => SqlType::String,
            BindValue::Timestamp(_) => SqlType::DateTime,
            BindValue::Uuid(_) => SqlType::Uuid,
            BindValue::Json(_) => SqlType::Json,
            // Expanding lists take the type of their first non-null element.
            BindValue::List(items) => items
                .iter()
                .map(SqlType::infer)
                .find(|t| !t.is_null())
                .unwrap_or(SqlType::Null),
        }
    }

    pub fn is_null(self) -> bool {
        self == SqlType::Null
    }

    /// Short name used in cache keys and debug output.
    pub fn name(self) -> &'static str {
        match self {
            SqlType::Null => "NULLTYPE",
            SqlType::Integer => "INTEGER",
            SqlType::Float => "FLOAT",
            SqlType::String => "VARCHAR",
            SqlType::Boolean => "BOOLEAN",
            SqlType::DateTime => "DATETIME",
            SqlType::Uuid => "UUID",
            SqlType::Json => "JSON",
        }
    }
}
