use super::{BindStyle, Dialect, Operator, Paging};
use crate::node::BinaryOp;
use crate::types::SqlType;

/// SQLite: `?` placeholders, integer booleans, `IS` for null-safe comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn bind_style(&self) -> BindStyle {
        BindStyle::Qmark
    }

    fn render_bool(&self, value: bool) -> &'static str {
        if value { "1" } else { "0" }
    }

    fn binary_operator(&self, op: BinaryOp) -> Option<Operator> {
        match op {
            BinaryOp::IsDistinctFrom => Some(Operator::Infix("IS NOT")),
            BinaryOp::IsNotDistinctFrom => Some(Operator::Infix("IS")),
            BinaryOp::ILike | BinaryOp::NotILike => None,
            _ => Some(Operator::Infix(op.as_sql())),
        }
    }

    fn paging(&self) -> Paging {
        Paging::LimitOffset {
            offset_only_limit: Some("-1"),
        }
    }

    fn type_name(&self, type_: SqlType) -> Option<&'static str> {
        match type_ {
            SqlType::Null => None,
            SqlType::Integer | SqlType::Boolean => Some("INTEGER"),
            SqlType::Float => Some("REAL"),
            SqlType::String | SqlType::DateTime | SqlType::Uuid | SqlType::Json => Some("TEXT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_spelling() {
        assert_eq!(Sqlite.render_bool(false), "0");
        assert_eq!(
            Sqlite.binary_operator(BinaryOp::IsDistinctFrom),
            Some(Operator::Infix("IS NOT"))
        );
        assert_eq!(Sqlite.binary_operator(BinaryOp::ILike), None);
    }
}
