//! Capability requirements declared by every consumption site.
//!
//! A [`Role`] names what a site accepts ("a FROM clause", "a column
//! expression", ...). This module is declarative: display names, capability
//! flags, and the table deciding which node kinds already satisfy a role.
//! Behaviour for values that do not lives in [`crate::coercion`].

use crate::diagnostics::ImplicitPolicy;
use crate::node::{Node, NodeKind};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    ExpressionElement,
    BinaryElement,
    InElement,
    OnClause,
    WhereHaving,
    StatementOption,
    ColumnArgument,
    ColumnArgumentOrKey,
    StrAsPlainColumn,
    ByOf,
    OrderBy,
    GroupBy,
    DmlColumn,
    ConstExpr,
    TruncatedLabel,
    DdlExpression,
    DdlConstraintColumn,
    DdlReferredColumn,
    LimitOffset,
    LabeledColumnExpr,
    ColumnsClause,
    ReturnsRows,
    Statement,
    SelectStatement,
    JoinTarget,
    FromClause,
    StrictFromClause,
    AnonymizedFromClause,
    DmlTable,
    DmlSelect,
    CompoundElement,
    LiteralValue,
}

impl Role {
    pub const COUNT: usize = 32;

    /// Every role, in declaration order (`Role::ALL[r as usize] == r`).
    pub const ALL: [Role; Role::COUNT] = [
        Role::ExpressionElement,
        Role::BinaryElement,
        Role::InElement,
        Role::OnClause,
        Role::WhereHaving,
        Role::StatementOption,
        Role::ColumnArgument,
        Role::ColumnArgumentOrKey,
        Role::StrAsPlainColumn,
        Role::ByOf,
        Role::OrderBy,
        Role::GroupBy,
        Role::DmlColumn,
        Role::ConstExpr,
        Role::TruncatedLabel,
        Role::DdlExpression,
        Role::DdlConstraintColumn,
        Role::DdlReferredColumn,
        Role::LimitOffset,
        Role::LabeledColumnExpr,
        Role::ColumnsClause,
        Role::ReturnsRows,
        Role::Statement,
        Role::SelectStatement,
        Role::JoinTarget,
        Role::FromClause,
        Role::StrictFromClause,
        Role::AnonymizedFromClause,
        Role::DmlTable,
        Role::DmlSelect,
        Role::CompoundElement,
        Role::LiteralValue,
    ];

    /// Human-readable name used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Role::ExpressionElement => "SQL expression element",
            Role::BinaryElement => "SQL expression element or literal value",
            Role::InElement => "IN expression list, SELECT construct, or bound parameter object",
            Role::OnClause => "ON clause, typically a SQL expression",
            Role::WhereHaving => "SQL expression for WHERE/HAVING role",
            Role::StatementOption => "statement sub-expression element",
            Role::ColumnArgument => "Column expression",
            Role::ColumnArgumentOrKey => "Column expression or string key",
            Role::StrAsPlainColumn => "Column expression or string key",
            Role::ByOf => "GROUP BY / OF / etc. expression",
            Role::OrderBy => "ORDER BY expression",
            Role::GroupBy => "GROUP BY expression",
            Role::DmlColumn => "SET/VALUES column expression or string key",
            Role::ConstExpr => "Constant True/False/None expression",
            Role::TruncatedLabel => "String SQL identifier",
            Role::DdlExpression => "SQL expression for DDL constraint",
            Role::DdlConstraintColumn => {
                "String column name or column expression for DDL constraint"
            }
            Role::DdlReferredColumn => {
                "String column name or Column object for DDL foreign key constraint"
            }
            Role::LimitOffset => "LIMIT / OFFSET expression",
            Role::LabeledColumnExpr => "Labeled column expression",
            Role::ColumnsClause => "Column expression or FROM clause",
            Role::ReturnsRows => "Row returning expression such as a SELECT, a FROM clause, \
                                  or an INSERT/UPDATE/DELETE with RETURNING",
            Role::Statement => "Executable SQL or text() construct",
            Role::SelectStatement => "SELECT construct or equivalent text() construct",
            Role::JoinTarget => "Join target, typically a FROM expression",
            Role::FromClause | Role::StrictFromClause => {
                "FROM expression, such as a Table or alias() object"
            }
            Role::AnonymizedFromClause => "FROM expression that can be safely anonymized",
            Role::DmlTable => "subject table for an INSERT, UPDATE or DELETE",
            Role::DmlSelect => "SELECT statement or equivalent textual object",
            Role::CompoundElement => {
                "SELECT construct for inclusion in a UNION or other set construct"
            }
            Role::LiteralValue => "Literal value",
        }
    }

    /// Whether a deferred (lambda) expression is accepted in place of a node.
    pub const fn allows_lambda(self) -> bool {
        matches!(
            self,
            Role::ColumnsClause
                | Role::OnClause
                | Role::WhereHaving
                | Role::OrderBy
                | Role::GroupBy
                | Role::Statement
        )
    }

    /// Whether external handles are asked for their inspection form.
    pub const fn uses_inspection(self) -> bool {
        matches!(
            self,
            Role::ColumnsClause
                | Role::GroupBy
                | Role::JoinTarget
                | Role::FromClause
                | Role::StrictFromClause
                | Role::AnonymizedFromClause
                | Role::DmlTable
        )
    }

    /// Literal-only roles never accept pre-built nodes.
    pub const fn is_literal_only(self) -> bool {
        matches!(self, Role::TruncatedLabel | Role::LiteralValue)
    }

    /// Policy applied to implicit and deprecated conversions unless overridden.
    pub const fn default_policy(self) -> ImplicitPolicy {
        ImplicitPolicy::Warn
    }

    /// Whether `node` already is of a kind this role accepts unchanged.
    pub fn is_satisfied_by(self, node: &Node) -> bool {
        if node.is_deferred() {
            return self.allows_lambda();
        }
        let column = node.is_column_element();
        let from = node.is_from_clause();
        let select = node.is_select_statement();
        let text = node.is_text();

        match self {
            Role::ExpressionElement
            | Role::BinaryElement
            | Role::OnClause
            | Role::WhereHaving
            | Role::StatementOption
            | Role::ByOf
            | Role::OrderBy
            | Role::GroupBy
            | Role::DdlExpression
            | Role::DdlConstraintColumn => column || text,
            Role::ColumnArgument
            | Role::ColumnArgumentOrKey
            | Role::DmlColumn
            | Role::LimitOffset => column,
            Role::InElement => {
                select
                    || text
                    || matches!(
                        node.kind(),
                        NodeKind::BindParam(_)
                            | NodeKind::ClauseList { .. }
                            | NodeKind::ScalarSubquery(_)
                    )
            }
            Role::StrAsPlainColumn | Role::DdlReferredColumn => {
                matches!(node.kind(), NodeKind::Column(_))
            }
            Role::ConstExpr => matches!(
                node.kind(),
                NodeKind::Null | NodeKind::True | NodeKind::False
            ),
            Role::TruncatedLabel | Role::LiteralValue => false,
            Role::LabeledColumnExpr => {
                matches!(node.kind(), NodeKind::Label { .. } | NodeKind::Column(_))
            }
            Role::ColumnsClause => column || from || text,
            Role::ReturnsRows => from || select || node.is_dml(),
            Role::Statement => select || text || node.is_dml(),
            Role::SelectStatement
            | Role::DmlSelect
            | Role::CompoundElement => select,
            Role::JoinTarget | Role::FromClause => from || text,
            Role::StrictFromClause | Role::AnonymizedFromClause => from,
            Role::DmlTable => matches!(node.kind(), NodeKind::Table(_)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
