//! Column-expression constructors and operators.

use super::selectable::SelectableOps;
use super::{BinaryOp, BindParam, Column, ListOp, Node, NodeKind, NodeRef, NullsOrder, UnaryOp};
use crate::coercion::{CoercionArgs, Input, coerce_key, coerce_node};
use crate::diagnostics::Diagnostic;
use crate::error::{ClauseError, ClauseResult};
use crate::role::Role;
use crate::types::SqlType;
use crate::value::BindValue;
use std::sync::Arc;

fn build(kind: NodeKind, type_: SqlType, diagnostics: Vec<Diagnostic>) -> NodeRef {
    Node::typed(kind, type_)
        .with_diagnostics(diagnostics)
        .into_ref()
}

/// A column not (yet) bound to a table.
pub fn column(name: impl Into<String>) -> NodeRef {
    column_typed(name, SqlType::Null)
}

pub fn column_typed(name: impl Into<String>, type_: SqlType) -> NodeRef {
    Node::typed(
        NodeKind::Column(Column {
            name: name.into(),
            table: None,
            is_literal: false,
        }),
        type_,
    )
    .into_ref()
}

/// A column whose name is rendered verbatim (`*`, `1`, `count(*)`).
pub fn literal_column(text: impl Into<String>) -> NodeRef {
    Node::new(NodeKind::Column(Column {
        name: text.into(),
        table: None,
        is_literal: true,
    }))
    .into_ref()
}

/// An anonymous bound literal.
pub fn literal(value: impl Into<Input>) -> ClauseResult<NodeRef> {
    let (node, _) = coerce_node(Role::LiteralValue, value.into(), &CoercionArgs::new())?;
    Ok(node)
}

/// A named bound parameter; its name is used as-is in the rendered SQL.
pub fn bindparam(key: impl Into<String>, value: impl Into<BindValue>) -> NodeRef {
    let value = value.into();
    let type_ = SqlType::infer(&value);
    Node::typed(
        NodeKind::BindParam(BindParam {
            key: Some(key.into()),
            value,
            unique: false,
            expanding: false,
            crud: false,
        }),
        type_,
    )
    .into_ref()
}

/// A named parameter expanded into one placeholder per element at compile time.
pub fn expanding_bindparam<T: Into<BindValue>>(
    key: impl Into<String>,
    values: impl IntoIterator<Item = T>,
) -> NodeRef {
    let value = BindValue::List(values.into_iter().map(Into::into).collect());
    let type_ = SqlType::infer(&value);
    Node::typed(
        NodeKind::BindParam(BindParam {
            key: Some(key.into()),
            value,
            unique: false,
            expanding: true,
            crud: false,
        }),
        type_,
    )
    .into_ref()
}

pub fn null() -> NodeRef {
    Node::new(NodeKind::Null).into_ref()
}

pub fn true_() -> NodeRef {
    Node::typed(NodeKind::True, SqlType::Boolean).into_ref()
}

pub fn false_() -> NodeRef {
    Node::typed(NodeKind::False, SqlType::Boolean).into_ref()
}

/// Literal SQL, rendered verbatim.
pub fn text(sql: impl Into<String>) -> NodeRef {
    Node::new(NodeKind::Text(sql.into())).into_ref()
}

/// Conjunction of one or more predicates.
pub fn and_<I, T>(clauses: I) -> ClauseResult<NodeRef>
where
    I: IntoIterator<Item = T>,
    T: Into<Input>,
{
    boolean_list(ListOp::And, "and_", clauses)
}

/// Disjunction of one or more predicates.
pub fn or_<I, T>(clauses: I) -> ClauseResult<NodeRef>
where
    I: IntoIterator<Item = T>,
    T: Into<Input>,
{
    boolean_list(ListOp::Or, "or_", clauses)
}

fn boolean_list<I, T>(op: ListOp, fname: &str, clauses: I) -> ClauseResult<NodeRef>
where
    I: IntoIterator<Item = T>,
    T: Into<Input>,
{
    let args = CoercionArgs::new().argname("clauses");
    let mut flat = Vec::new();
    let mut diagnostics = Vec::new();
    for clause in clauses {
        let (node, diags) = coerce_node(Role::WhereHaving, clause.into(), &args)?;
        diagnostics.extend(diags);
        match node.kind() {
            NodeKind::ClauseList { op: inner, clauses } if *inner == op => {
                flat.extend(clauses.iter().cloned())
            }
            _ => flat.push(node),
        }
    }
    if flat.is_empty() {
        return Err(ClauseError::construction(format!(
            "{fname}() requires at least one clause"
        )));
    }
    Ok(build(
        NodeKind::ClauseList { op, clauses: flat },
        SqlType::Boolean,
        diagnostics,
    ))
}

/// Logical negation; comparisons are negated by flipping their operator.
pub fn not_(clause: impl Into<Input>) -> ClauseResult<NodeRef> {
    let (node, diagnostics) =
        coerce_node(Role::WhereHaving, clause.into(), &CoercionArgs::new())?;
    if let NodeKind::Binary { left, op, right } = node.kind() {
        if let Some(negated) = op.negate() {
            return Ok(build(
                NodeKind::Binary {
                    left: Arc::clone(left),
                    op: negated,
                    right: Arc::clone(right),
                },
                SqlType::Boolean,
                diagnostics,
            ));
        }
    }
    Ok(build(
        NodeKind::Unary {
            op: UnaryOp::Not,
            operand: node,
        },
        SqlType::Boolean,
        diagnostics,
    ))
}

/// A SQL function call.
pub fn func<I, T>(name: impl Into<String>, args: I) -> ClauseResult<NodeRef>
where
    I: IntoIterator<Item = T>,
    T: Into<Input>,
{
    let name = name.into();
    let mut nodes = Vec::new();
    let mut diagnostics = Vec::new();
    for arg in args {
        let (node, diags) =
            coerce_node(Role::ExpressionElement, arg.into(), &CoercionArgs::new())?;
        diagnostics.extend(diags);
        nodes.push(node);
    }
    let type_ = match name.to_ascii_lowercase().as_str() {
        "count" => SqlType::Integer,
        "now" | "current_timestamp" => SqlType::DateTime,
        _ => nodes.first().map(|n| n.sql_type()).unwrap_or_default(),
    };
    Ok(build(
        NodeKind::Function { name, args: nodes },
        type_,
        diagnostics,
    ))
}

pub fn cast(value: impl Into<Input>, to: SqlType) -> ClauseResult<NodeRef> {
    let (node, diagnostics) =
        coerce_node(Role::ExpressionElement, value.into(), &CoercionArgs::new())?;
    cast_node(node, to, diagnostics)
}

fn cast_node(element: NodeRef, to: SqlType, diagnostics: Vec<Diagnostic>) -> ClauseResult<NodeRef> {
    if to.is_null() {
        return Err(ClauseError::construction(
            "CAST requires a concrete target type",
        ));
    }
    Ok(build(NodeKind::Cast { element, to }, to, diagnostics))
}

/// `EXISTS (subquery)`.
pub fn exists(select: &NodeRef) -> ClauseResult<NodeRef> {
    let subquery = select.scalar_subquery()?;
    Ok(build(
        NodeKind::Unary {
            op: UnaryOp::Exists,
            operand: subquery,
        },
        SqlType::Boolean,
        Vec::new(),
    ))
}

/// Operators and modifiers available on every node handle.
///
/// Right-hand operands are coerced with the binary-element role against
/// `self`, so plain values become bound parameters typed like the left side.
pub trait ExprOps {
    fn eq(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn ne(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn lt(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn le(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn gt(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn ge(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn is_null(&self) -> NodeRef;
    fn is_not_null(&self) -> NodeRef;
    fn is_distinct_from(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn is_not_distinct_from(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn like(&self, pattern: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn not_like(&self, pattern: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn ilike(&self, pattern: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn not_ilike(&self, pattern: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn in_(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn not_in(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn between(&self, low: impl Into<Input>, high: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn add(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn sub(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn mul(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn div(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn modulo(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn concat(&self, other: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn neg(&self) -> NodeRef;
    fn distinct(&self) -> NodeRef;
    fn cast(&self, to: SqlType) -> ClauseResult<NodeRef>;
    fn label(&self, name: impl Into<Input>) -> ClauseResult<NodeRef>;
    /// Label with a synthetic name assigned at compile time.
    fn anon_label(&self) -> NodeRef;
    fn asc(&self) -> NodeRef;
    fn desc(&self) -> NodeRef;
    fn nulls_first(&self) -> NodeRef;
    fn nulls_last(&self) -> NodeRef;
}

impl ExprOps for NodeRef {
    fn eq(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        compare(self, BinaryOp::Eq, other.into())
    }

    fn ne(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        compare(self, BinaryOp::Ne, other.into())
    }

    fn lt(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        compare(self, BinaryOp::Lt, other.into())
    }

    fn le(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        compare(self, BinaryOp::Le, other.into())
    }

    fn gt(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        compare(self, BinaryOp::Gt, other.into())
    }

    fn ge(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        compare(self, BinaryOp::Ge, other.into())
    }

    fn is_null(&self) -> NodeRef {
        binary(self, BinaryOp::Is, null(), SqlType::Boolean, Vec::new())
    }

    fn is_not_null(&self) -> NodeRef {
        binary(self, BinaryOp::IsNot, null(), SqlType::Boolean, Vec::new())
    }

    fn is_distinct_from(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        compare(self, BinaryOp::IsDistinctFrom, other.into())
    }

    fn is_not_distinct_from(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        compare(self, BinaryOp::IsNotDistinctFrom, other.into())
    }

    fn like(&self, pattern: impl Into<Input>) -> ClauseResult<NodeRef> {
        compare(self, BinaryOp::Like, pattern.into())
    }

    fn not_like(&self, pattern: impl Into<Input>) -> ClauseResult<NodeRef> {
        compare(self, BinaryOp::NotLike, pattern.into())
    }

    fn ilike(&self, pattern: impl Into<Input>) -> ClauseResult<NodeRef> {
        compare(self, BinaryOp::ILike, pattern.into())
    }

    fn not_ilike(&self, pattern: impl Into<Input>) -> ClauseResult<NodeRef> {
        compare(self, BinaryOp::NotILike, pattern.into())
    }

    fn in_(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        membership(self, BinaryOp::In, other.into())
    }

    fn not_in(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        membership(self, BinaryOp::NotIn, other.into())
    }

    fn between(&self, low: impl Into<Input>, high: impl Into<Input>) -> ClauseResult<NodeRef> {
        let args = CoercionArgs::new()
            .expr(Arc::clone(self))
            .operator(BinaryOp::Between);
        let (low, mut diagnostics) = coerce_node(Role::BinaryElement, low.into(), &args)?;
        let (high, diags) = coerce_node(Role::BinaryElement, high.into(), &args)?;
        diagnostics.extend(diags);
        let range = build(
            NodeKind::ClauseList {
                op: ListOp::And,
                clauses: vec![low, high],
            },
            SqlType::Boolean,
            Vec::new(),
        );
        Ok(binary(
            self,
            BinaryOp::Between,
            range,
            SqlType::Boolean,
            diagnostics,
        ))
    }

    fn add(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        arithmetic(self, BinaryOp::Add, other.into())
    }

    fn sub(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        arithmetic(self, BinaryOp::Sub, other.into())
    }

    fn mul(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        arithmetic(self, BinaryOp::Mul, other.into())
    }

    fn div(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        arithmetic(self, BinaryOp::Div, other.into())
    }

    fn modulo(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        arithmetic(self, BinaryOp::Mod, other.into())
    }

    fn concat(&self, other: impl Into<Input>) -> ClauseResult<NodeRef> {
        arithmetic(self, BinaryOp::Concat, other.into())
    }

    fn neg(&self) -> NodeRef {
        unary(self, UnaryOp::Neg, self.sql_type())
    }

    fn distinct(&self) -> NodeRef {
        unary(self, UnaryOp::Distinct, self.sql_type())
    }

    fn cast(&self, to: SqlType) -> ClauseResult<NodeRef> {
        cast_node(Arc::clone(self), to, Vec::new())
    }

    fn label(&self, name: impl Into<Input>) -> ClauseResult<NodeRef> {
        let (name, diagnostics) = coerce_key(
            Role::TruncatedLabel,
            name.into(),
            &CoercionArgs::new().argname("name"),
        )?;
        Ok(build(
            NodeKind::Label {
                name: Some(name),
                element: Arc::clone(self),
            },
            self.sql_type(),
            diagnostics,
        ))
    }

    fn anon_label(&self) -> NodeRef {
        build(
            NodeKind::Label {
                name: None,
                element: Arc::clone(self),
            },
            self.sql_type(),
            Vec::new(),
        )
    }

    fn asc(&self) -> NodeRef {
        ordering(self, Some(false), None)
    }

    fn desc(&self) -> NodeRef {
        ordering(self, Some(true), None)
    }

    fn nulls_first(&self) -> NodeRef {
        ordering(self, None, Some(NullsOrder::First))
    }

    fn nulls_last(&self) -> NodeRef {
        ordering(self, None, Some(NullsOrder::Last))
    }
}

pub(crate) fn binary(
    left: &NodeRef,
    op: BinaryOp,
    right: NodeRef,
    type_: SqlType,
    diagnostics: Vec<Diagnostic>,
) -> NodeRef {
    build(
        NodeKind::Binary {
            left: Arc::clone(left),
            op,
            right,
        },
        type_,
        diagnostics,
    )
}

fn unary(operand: &NodeRef, op: UnaryOp, type_: SqlType) -> NodeRef {
    build(
        NodeKind::Unary {
            op,
            operand: Arc::clone(operand),
        },
        type_,
        Vec::new(),
    )
}

fn compare(left: &NodeRef, op: BinaryOp, other: Input) -> ClauseResult<NodeRef> {
    if other.is_none() {
        let op = match op {
            BinaryOp::Eq | BinaryOp::Is => BinaryOp::Is,
            BinaryOp::Ne | BinaryOp::IsNot => BinaryOp::IsNot,
            BinaryOp::IsDistinctFrom | BinaryOp::IsNotDistinctFrom => op,
            _ => {
                return Err(ClauseError::construction(
                    "Only '=', '!=', IS, IS NOT, IS DISTINCT FROM and IS NOT DISTINCT FROM \
                     operators can be used with None",
                ));
            }
        };
        return Ok(binary(left, op, null(), SqlType::Boolean, Vec::new()));
    }

    let args = CoercionArgs::new().expr(Arc::clone(left)).operator(op);
    let (right, diagnostics) = coerce_node(Role::BinaryElement, other, &args)?;
    Ok(binary(left, op, right, SqlType::Boolean, diagnostics))
}

fn arithmetic(left: &NodeRef, op: BinaryOp, other: Input) -> ClauseResult<NodeRef> {
    let args = CoercionArgs::new().expr(Arc::clone(left)).operator(op);
    let (right, diagnostics) = coerce_node(Role::BinaryElement, other, &args)?;
    let type_ = match (op, left.sql_type()) {
        (BinaryOp::Concat, _) => SqlType::String,
        (_, SqlType::Null) => right.sql_type(),
        (_, ty) => ty,
    };
    Ok(binary(left, op, right, type_, diagnostics))
}

fn membership(left: &NodeRef, op: BinaryOp, other: Input) -> ClauseResult<NodeRef> {
    let args = CoercionArgs::new().expr(Arc::clone(left)).operator(op);
    let (right, diagnostics) = coerce_node(Role::InElement, other, &args)?;
    Ok(binary(left, op, right, SqlType::Boolean, diagnostics))
}

fn ordering(node: &NodeRef, descending: Option<bool>, nulls: Option<NullsOrder>) -> NodeRef {
    let (element, was_desc, was_nulls) = match node.kind() {
        NodeKind::Ordering {
            element,
            descending,
            nulls,
        } => (Arc::clone(element), *descending, *nulls),
        _ => (Arc::clone(node), false, None),
    };
    build(
        NodeKind::Ordering {
            element,
            descending: descending.unwrap_or(was_desc),
            nulls: nulls.or(was_nulls),
        },
        node.sql_type(),
        Vec::new(),
    )
}
