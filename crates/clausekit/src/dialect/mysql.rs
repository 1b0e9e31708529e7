use super::{BindStyle, Dialect, Operator, Paging, quote_string};
use crate::node::BinaryOp;
use crate::types::SqlType;

/// MySQL: `%s` placeholders, backtick quoting, `concat()` and `<=>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mysql;

impl Dialect for Mysql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn bind_style(&self) -> BindStyle {
        BindStyle::Format
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    fn binary_operator(&self, op: BinaryOp) -> Option<Operator> {
        match op {
            BinaryOp::Concat => Some(Operator::Function("concat")),
            BinaryOp::IsNotDistinctFrom => Some(Operator::Infix("<=>")),
            BinaryOp::IsDistinctFrom => Some(Operator::NegatedInfix("<=>")),
            BinaryOp::ILike | BinaryOp::NotILike => None,
            _ => Some(Operator::Infix(op.as_sql())),
        }
    }

    fn paging(&self) -> Paging {
        Paging::LimitOffset {
            offset_only_limit: Some("18446744073709551615"),
        }
    }

    fn type_name(&self, type_: SqlType) -> Option<&'static str> {
        match type_ {
            SqlType::Null | SqlType::Boolean | SqlType::Float => None,
            SqlType::Integer => Some("SIGNED INTEGER"),
            SqlType::String | SqlType::Uuid => Some("CHAR"),
            SqlType::DateTime => Some("DATETIME"),
            SqlType::Json => Some("JSON"),
        }
    }

    /// Backslash is an escape character inside MySQL string literals.
    fn string_literal(&self, value: &str) -> String {
        quote_string(&value.replace('\\', "\\\\"))
    }

    fn supports_returning(&self) -> bool {
        false
    }

    fn empty_set_expr(&self) -> &'static str {
        "(SELECT 1 FROM (SELECT 1) AS _empty_set WHERE 1!=1)"
    }

    fn default_values(&self) -> &'static str {
        "() VALUES ()"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BindValue;

    #[test]
    fn mysql_spelling() {
        assert_eq!(Mysql.quote_identifier("Order"), "`Order`");
        assert_eq!(Mysql.quote_identifier("we`ird"), "`we``ird`");
        assert_eq!(
            Mysql.binary_operator(BinaryOp::Concat),
            Some(Operator::Function("concat"))
        );
        assert!(!Mysql.supports_returning());
        assert_eq!(Mysql.type_name(SqlType::Boolean), None);
    }

    #[test]
    fn string_literals_escape_backslashes() {
        assert_eq!(Mysql.string_literal(r"a\b"), r"'a\\b'");
        assert_eq!(
            Mysql.render_literal(&BindValue::from(r"\' OR 1=1 -- ")).unwrap(),
            r"'\\'' OR 1=1 -- '"
        );
        assert_eq!(crate::dialect::Postgres.string_literal(r"a\b"), r"'a\b'");
    }
}
