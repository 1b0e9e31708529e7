use super::{BindStyle, Dialect, Operator};
use crate::node::BinaryOp;
use crate::types::SqlType;

/// PostgreSQL: `$n` placeholders, native ILIKE and JSONB.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn bind_style(&self) -> BindStyle {
        BindStyle::Numbered
    }

    fn binary_operator(&self, op: BinaryOp) -> Option<Operator> {
        Some(Operator::Infix(op.as_sql()))
    }

    fn type_name(&self, type_: SqlType) -> Option<&'static str> {
        match type_ {
            SqlType::Null => None,
            SqlType::Integer => Some("BIGINT"),
            SqlType::Float => Some("DOUBLE PRECISION"),
            SqlType::String => Some("TEXT"),
            SqlType::Boolean => Some("BOOLEAN"),
            SqlType::DateTime => Some("TIMESTAMP"),
            SqlType::Uuid => Some("UUID"),
            SqlType::Json => Some("JSONB"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_spelling() {
        assert_eq!(Postgres.quote_identifier("order"), "\"order\"");
        assert_eq!(Postgres.quote_identifier("orders"), "orders");
        assert_eq!(
            Postgres.binary_operator(BinaryOp::ILike),
            Some(Operator::Infix("ILIKE"))
        );
        assert_eq!(Postgres.type_name(SqlType::Json), Some("JSONB"));
    }
}
