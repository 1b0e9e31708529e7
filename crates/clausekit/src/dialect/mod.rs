//! Dialect policies consulted by the compiler.
//!
//! The compiler decides *what* to render; a [`Dialect`] decides how a few
//! database-specific pieces are spelled: identifier quoting, parameter
//! placeholders, boolean literals, some operators, paging and CAST types.
//!
//! # Example
//! ```ignore
//! use clausekit::dialect::{Dialect, Postgres, Sqlite};
//!
//! assert_eq!(Postgres.quote_identifier("user"), "\"user\"");
//! assert_eq!(Sqlite.render_bool(true), "1");
//! ```

mod generic;
mod mysql;
mod postgres;
mod sqlite;

pub use generic::Generic;
pub use mysql::Mysql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use crate::error::{ClauseError, ClauseResult};
use crate::node::BinaryOp;
use crate::types::SqlType;
use crate::value::BindValue;
use std::fmt;

/// Placeholder syntax for bound parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindStyle {
    /// `$1`, `$2`, ...
    Numbered,
    /// `?`
    Qmark,
    /// `:name`
    Named,
    /// `%s`
    Format,
}

impl BindStyle {
    /// Placeholder for the parameter at 1-based `position` named `name`.
    pub fn placeholder(self, position: usize, name: &str) -> String {
        match self {
            BindStyle::Numbered => format!("${position}"),
            BindStyle::Qmark => "?".to_string(),
            BindStyle::Named => format!(":{name}"),
            BindStyle::Format => "%s".to_string(),
        }
    }
}

/// How a binary operator is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `left op right`
    Infix(&'static str),
    /// `NOT (left op right)`
    NegatedInfix(&'static str),
    /// `name(left, right)`
    Function(&'static str),
}

/// Paging clause syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// `LIMIT n OFFSET m`; an OFFSET without LIMIT is preceded by
    /// `LIMIT <filler>` when the database requires one.
    LimitOffset {
        offset_only_limit: Option<&'static str>,
    },
    /// `OFFSET m ROWS FETCH FIRST n ROWS ONLY`
    OffsetFetch,
}

/// Words that always need quoting when used as identifiers.
pub const RESERVED_WORDS: &[&str] = &[
    "all", "and", "any", "as", "asc", "between", "both", "by", "case", "cast", "check",
    "column", "constraint", "create", "cross", "current_date", "current_time",
    "current_timestamp", "default", "delete", "desc", "distinct", "do", "else", "end",
    "except", "exists", "false", "fetch", "for", "foreign", "from", "full", "grant", "group",
    "having", "in", "inner", "insert", "intersect", "into", "is", "join", "leading", "left",
    "like", "limit", "natural", "not", "null", "offset", "on", "only", "or", "order", "outer",
    "primary", "references", "returning", "right", "select", "set", "some", "table", "then",
    "to", "trailing", "true", "union", "unique", "update", "user", "using", "values", "when",
    "where", "window", "with",
];

/// Whether `ident` must be quoted: anything other than a lowercase
/// `[a-z_][a-z0-9_$]*` word outside `reserved`.
pub fn requires_quotes(ident: &str, reserved: &[&str]) -> bool {
    let mut chars = ident.chars();
    let legal_start = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_lowercase());
    let legal_rest = chars.all(|c| c == '_' || c == '$' || c.is_ascii_lowercase() || c.is_ascii_digit());
    !(legal_start && legal_rest) || reserved.contains(&ident)
}

/// Wrap `ident` in `quote`, doubling embedded quote characters.
pub fn quote_with(ident: &str, quote: char) -> String {
    let mut out = String::with_capacity(ident.len() + 2);
    out.push(quote);
    for ch in ident.chars() {
        if ch == quote {
            out.push(quote);
        }
        out.push(ch);
    }
    out.push(quote);
    out
}

/// Spelling policy for one database.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Short name, also used to separate cache entries per dialect.
    fn name(&self) -> &'static str;

    fn bind_style(&self) -> BindStyle;

    fn identifier_quote(&self) -> char {
        '"'
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED_WORDS
    }

    /// Quote an identifier only when it requires quoting.
    fn quote_identifier(&self, ident: &str) -> String {
        if requires_quotes(ident, self.reserved_words()) {
            quote_with(ident, self.identifier_quote())
        } else {
            ident.to_string()
        }
    }

    fn render_bool(&self, value: bool) -> &'static str {
        if value { "true" } else { "false" }
    }

    /// Spelling of `op`, or `None` when the database has no equivalent.
    fn binary_operator(&self, op: BinaryOp) -> Option<Operator> {
        match op {
            BinaryOp::ILike | BinaryOp::NotILike => None,
            _ => Some(Operator::Infix(op.as_sql())),
        }
    }

    fn paging(&self) -> Paging {
        Paging::LimitOffset {
            offset_only_limit: None,
        }
    }

    /// Type name used in CAST; `None` for types the database cannot cast to.
    fn type_name(&self, type_: SqlType) -> Option<&'static str> {
        match type_ {
            SqlType::Null => None,
            SqlType::Integer => Some("INTEGER"),
            SqlType::Float => Some("FLOAT"),
            SqlType::String => Some("VARCHAR"),
            SqlType::Boolean => Some("BOOLEAN"),
            SqlType::DateTime => Some("TIMESTAMP"),
            SqlType::Uuid => Some("UUID"),
            SqlType::Json => Some("JSON"),
        }
    }

    /// String value as an inline SQL literal.
    fn string_literal(&self, value: &str) -> String {
        quote_string(value)
    }

    /// Render a value inline (used with `literal_binds`).
    fn render_literal(&self, value: &BindValue) -> ClauseResult<String> {
        Ok(match value {
            BindValue::Null => "NULL".to_string(),
            BindValue::Bool(v) => self.render_bool(*v).to_string(),
            BindValue::Int(v) => v.to_string(),
            BindValue::Float(v) if v.is_finite() => format!("{v:?}"),
            BindValue::Float(v) => {
                return Err(ClauseError::compile(format!(
                    "cannot render non-finite float {v} as a literal"
                )));
            }
            BindValue::Text(v) => self.string_literal(v),
            BindValue::Timestamp(v) => {
                self.string_literal(&v.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            },
            BindValue::Uuid(v) => self.string_literal(&v.to_string()),
            BindValue::Json(v) => self.string_literal(&v.to_string()),
            BindValue::List(_) => {
                return Err(ClauseError::compile(
                    "a list value can only be rendered by an expanding parameter",
                ));
            }
        })
    }

    fn supports_returning(&self) -> bool {
        true
    }

    /// Subquery standing in for an empty expanding IN list.
    fn empty_set_expr(&self) -> &'static str {
        "(SELECT 1 WHERE 1!=1)"
    }

    /// Body of an INSERT without values.
    fn default_values(&self) -> &'static str {
        "DEFAULT VALUES"
    }
}

/// Single-quoted SQL string literal.
pub fn quote_string(value: &str) -> String {
    quote_with(value, '\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lowercase_names_are_not_quoted() {
        assert!(!requires_quotes("users", RESERVED_WORDS));
        assert!(!requires_quotes("user_id2", RESERVED_WORDS));
    }

    #[test]
    fn reserved_uppercase_and_odd_names_are_quoted() {
        assert!(requires_quotes("select", RESERVED_WORDS));
        assert!(requires_quotes("UserTable", RESERVED_WORDS));
        assert!(requires_quotes("2fast", RESERVED_WORDS));
        assert!(requires_quotes("has space", RESERVED_WORDS));
        assert!(requires_quotes("", RESERVED_WORDS));
    }

    #[test]
    fn quote_doubles_embedded_quotes() {
        assert_eq!(quote_with(r#"has"quote"#, '"'), r#""has""quote""#);
        assert_eq!(quote_string("it's"), "'it''s'");
    }

    #[test]
    fn placeholders() {
        assert_eq!(BindStyle::Numbered.placeholder(3, "x"), "$3");
        assert_eq!(BindStyle::Qmark.placeholder(3, "x"), "?");
        assert_eq!(BindStyle::Named.placeholder(3, "x"), ":x");
        assert_eq!(BindStyle::Format.placeholder(3, "x"), "%s");
    }
}
