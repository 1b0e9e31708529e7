//! One behaviour object per [`Role`].

use super::{Coerced, Cx, Input};
use crate::error::{ArgumentError, ClauseError, ClauseResult};
use crate::node::{
    BindParam, Column, ExprOps, Join, ListOp, Node, NodeKind, NodeRef, SelectableOps, alias_node,
    deannotate, deep_deannotate, false_, literal_column, null, retype, rewrite, text, true_,
};
use crate::role::Role;
use crate::types::SqlType;
use crate::value::BindValue;
use std::sync::Arc;

const SCALAR_SUBQUERY_COERCION: &str = "implicitly coercing SELECT object to scalar subquery; \
     please use the .scalar_subquery() method to produce a scalar subquery.";

const SELECT_INTO_FROM: &str = "Implicit coercion of SELECT and textual SELECT constructs into \
     FROM clauses is deprecated; please call .subquery() on any Core select or ORM Query object \
     in order to produce a subquery object.";

const STRING_JOIN_TARGET: &str = "Using strings to indicate relationship names in join() is \
     deprecated; please use the class-bound attribute directly.";

const PLAIN_STRING_STATEMENT: &str = "Using plain strings to indicate SQL statements without \
     using the text() construct is deprecated. Ensure plain SQL statements are passed using the \
     text() construct.";

/// Remediation hint and optional error code attached to a coercion failure.
pub(crate) type Advice = (String, Option<&'static str>);

/// Behaviour of one role. Each hook is only reached for values the previous
/// step could not settle.
pub(crate) trait RoleImpl: Send + Sync {
    fn role(&self) -> Role;

    /// Turn a plain value into a node (or key).
    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        Err(self.expected(input, None, cx))
    }

    /// Convert a resolved value that does not satisfy the role.
    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        Err(self.expected(original, Some(&resolved), cx))
    }

    /// Final adjustment of a node that satisfies the role.
    fn post_coercion(
        &self,
        resolved: NodeRef,
        _original: &Input,
        _cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        Ok(Coerced::Node(resolved))
    }

    fn advice(&self, _original: &Input, _resolved: Option<&Coerced>) -> Option<Advice> {
        None
    }

    /// The "<role> expected, got <value>." error.
    fn expected(&self, original: &Input, resolved: Option<&Coerced>, cx: &Cx<'_>) -> ClauseError {
        let resolved_repr = resolved
            .filter(|r| !is_same(r, original))
            .map(Coerced::repr);
        self.expected_with(original, resolved_repr, self.advice(original, resolved), cx)
    }

    /// Same as [`expected`](RoleImpl::expected) for a terminal value that is
    /// not a node at all.
    fn expected_resolved(&self, original: &Input, resolved: String, cx: &Cx<'_>) -> ClauseError {
        self.expected_with(original, Some(resolved), self.advice(original, None), cx)
    }

    fn expected_with(
        &self,
        original: &Input,
        resolved: Option<String>,
        advice: Option<Advice>,
        cx: &Cx<'_>,
    ) -> ClauseError {
        let (advice, code) = match advice {
            Some((advice, code)) => (Some(advice), code),
            None => (None, None),
        };
        ArgumentError::expected(
            self.role().name(),
            original.repr(),
            cx.argname(),
            resolved,
            advice,
            code,
        )
        .into()
    }
}

pub(crate) fn impl_for(role: Role) -> &'static dyn RoleImpl {
    match role {
        Role::ExpressionElement => &ExpressionElementImpl,
        Role::BinaryElement => &BinaryElementImpl,
        Role::InElement => &InElementImpl,
        Role::OnClause => &OnClauseImpl,
        Role::WhereHaving => &WhereHavingImpl,
        Role::StatementOption => &StatementOptionImpl,
        Role::ColumnArgument => &NoTextImpl(Role::ColumnArgument),
        Role::ColumnArgumentOrKey => &StringKeyImpl(Role::ColumnArgumentOrKey),
        Role::StrAsPlainColumn => &StrAsPlainColumnImpl,
        Role::ByOf => &ByOfImpl(Role::ByOf),
        Role::OrderBy => &OrderByImpl,
        Role::GroupBy => &GroupByImpl,
        Role::DmlColumn => &DmlColumnImpl,
        Role::ConstExpr => &ConstExprImpl,
        Role::TruncatedLabel => &TruncatedLabelImpl,
        Role::DdlExpression => &DdlExpressionImpl,
        Role::DdlConstraintColumn => &DdlColumnImpl(Role::DdlConstraintColumn),
        Role::DdlReferredColumn => &DdlColumnImpl(Role::DdlReferredColumn),
        Role::LimitOffset => &LimitOffsetImpl,
        Role::LabeledColumnExpr => &LabeledColumnExprImpl,
        Role::ColumnsClause => &ColumnsClauseImpl,
        Role::ReturnsRows => &ReturnsRowsImpl,
        Role::Statement => &StatementImpl,
        Role::SelectStatement => &SelectStatementImpl,
        Role::JoinTarget => &JoinTargetImpl,
        Role::FromClause => &FromClauseImpl,
        Role::StrictFromClause => &StrictFromClauseImpl(Role::StrictFromClause),
        Role::AnonymizedFromClause => &StrictFromClauseImpl(Role::AnonymizedFromClause),
        Role::DmlTable => &DmlTableImpl,
        Role::DmlSelect => &DmlSelectImpl,
        Role::CompoundElement => &CompoundElementImpl,
        Role::LiteralValue => &LiteralValueImpl,
    }
}

// ==================== Shared building blocks ====================

fn is_same(resolved: &Coerced, original: &Input) -> bool {
    match (resolved, original) {
        (Coerced::Node(a), Input::Node(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

fn node(n: NodeRef) -> ClauseResult<Coerced> {
    Ok(Coerced::Node(n))
}

fn unique_bind(
    key: Option<String>,
    value: BindValue,
    type_: Option<SqlType>,
    crud: bool,
    expanding: bool,
) -> NodeRef {
    let type_ = type_.unwrap_or_else(|| SqlType::infer(&value));
    Node::typed(
        NodeKind::BindParam(BindParam {
            key,
            value,
            unique: true,
            expanding,
            crud,
        }),
        type_,
    )
    .into_ref()
}

/// A bind parameter compared against `expr`: keyed by its name, typed by the
/// value or else by `expr`.
fn bind_against(expr: Option<&NodeRef>, value: BindValue, expanding: bool) -> NodeRef {
    let key = expr.and_then(|e| match e.kind() {
        NodeKind::Column(c) if !c.is_literal => Some(c.name.clone()),
        NodeKind::Label {
            name: Some(name), ..
        } => Some(name.clone()),
        _ => None,
    });
    let mut type_ = SqlType::infer(&value);
    if type_.is_null() {
        type_ = expr.map_or(SqlType::Null, |e| e.sql_type());
    }
    unique_bind(key, value, Some(type_), false, expanding)
}

/// Whether plain strings are rejected with the "declare it as text()" message.
fn text_is_expected(role: Role) -> bool {
    role == Role::SelectStatement || role.is_satisfied_by(&text(""))
}

fn argname_clause(cx: &Cx<'_>) -> String {
    cx.argname()
        .map(|a| format!("for argument {a} "))
        .unwrap_or_default()
}

fn no_text_error(s: &str, cx: &Cx<'_>) -> ClauseError {
    let expr = Input::Str(ellipses(s)).repr();
    ArgumentError::with_message(
        cx.role.name(),
        Input::Str(s.to_string()).repr(),
        cx.argname(),
        format!(
            "Textual SQL expression {expr} {}should be explicitly declared as text({expr})",
            argname_clause(cx)
        ),
    )
    .into()
}

fn ellipses(s: &str) -> String {
    const MAX: usize = 25;
    if s.chars().count() <= MAX {
        s.to_string()
    } else {
        let head: String = s.chars().take(MAX).collect();
        format!("{head}...")
    }
}

/// Literal coercion for roles that reject every literal, with the text
/// message for strings where textual SQL would be valid.
fn no_text_coercion<R: RoleImpl + ?Sized>(
    imp: &R,
    input: &Input,
    cx: &Cx<'_>,
) -> ClauseResult<Coerced> {
    match input {
        Input::Str(s) if text_is_expected(cx.role) => Err(no_text_error(s, cx)),
        _ => Err(imp.expected(input, None, cx)),
    }
}

#[derive(Clone, Copy, Default)]
struct Literals {
    consts: bool,
    numerics: bool,
    star: bool,
}

impl Literals {
    const CONSTS: Literals = Literals {
        consts: true,
        numerics: false,
        star: false,
    };
}

/// Literal coercion driven by per-role flags; strings other than `*` go to
/// `on_text`.
fn coerce_literals<R, F>(
    imp: &R,
    input: &Input,
    flags: Literals,
    cx: &mut Cx<'_>,
    on_text: F,
) -> ClauseResult<Coerced>
where
    R: RoleImpl + ?Sized,
    F: FnOnce(&str, &mut Cx<'_>) -> ClauseResult<Coerced>,
{
    match input {
        Input::Str(s) if flags.star && s == "*" => node(literal_column("*")),
        Input::Str(s) => on_text(s, cx),
        Input::None if flags.consts => node(null()),
        Input::Bool(true) if flags.consts => node(true_()),
        Input::Bool(false) if flags.consts => node(false_()),
        Input::Int(v) if flags.numerics => node(literal_column(v.to_string())),
        Input::Float(v) if flags.numerics => node(literal_column(format!("{v:?}"))),
        _ => Err(imp.expected(input, None, cx)),
    }
}

/// SELECT (or a subquery of one) used where a column expression is required.
fn column_coercions<R: RoleImpl + ?Sized>(
    imp: &R,
    original: &Input,
    resolved: Coerced,
    cx: &mut Cx<'_>,
) -> ClauseResult<Coerced> {
    if let Coerced::Node(n) = &resolved {
        if n.is_select_statement() {
            cx.deprecated(SCALAR_SUBQUERY_COERCION)?;
            return node(n.scalar_subquery()?);
        }
        if let NodeKind::Subquery { element, .. } = n.kind() {
            cx.deprecated(SCALAR_SUBQUERY_COERCION)?;
            return node(element.scalar_subquery()?);
        }
    }
    Err(imp.expected(original, Some(&resolved), cx))
}

/// Roles that resolve plain strings to string keys.
fn returns_string_key<R: RoleImpl + ?Sized>(
    imp: &R,
    original: &Input,
    resolved: Coerced,
    cx: &Cx<'_>,
) -> ClauseResult<Coerced> {
    match original {
        Input::Str(s) => Ok(Coerced::Key(s.clone())),
        _ => Err(imp.expected(original, Some(&resolved), cx)),
    }
}

fn string_key<R: RoleImpl + ?Sized>(imp: &R, input: &Input, cx: &Cx<'_>) -> ClauseResult<Coerced> {
    match input {
        Input::Str(s) => Ok(Coerced::Key(s.clone())),
        _ => Err(imp.expected(input, None, cx)),
    }
}

fn select_is_not_from(original: &Input, resolved: Option<&Coerced>) -> Option<Advice> {
    let select = resolved
        .and_then(Coerced::node)
        .or_else(|| original.as_node())
        .filter(|n| n.is_select_statement())?;
    Some((
        format!(
            "To create a FROM clause from a {} object, use the .subquery() method.",
            select.kind_name()
        ),
        Some("89ve"),
    ))
}

fn table_valued_advice(original: &Input) -> Option<Advice> {
    original.as_node().filter(|n| n.is_from_clause()).map(|_| {
        (
            "To create a column expression from a FROM clause row as a whole, \
             use the .table_valued() method."
                .to_string(),
            None,
        )
    })
}

fn expression_literal<R: RoleImpl + ?Sized>(
    imp: &R,
    input: &Input,
    cx: &Cx<'_>,
) -> ClauseResult<Coerced> {
    if input.is_none() {
        return node(null());
    }
    match input.to_bind_value() {
        Some(value) => node(unique_bind(
            cx.args.name.clone(),
            value,
            cx.args.type_,
            cx.args.is_crud,
            false,
        )),
        None => Err(imp.expected(input, None, cx)),
    }
}

fn implicit_subquery(select: &NodeRef, cx: &mut Cx<'_>) -> ClauseResult<NodeRef> {
    cx.deprecated(SELECT_INTO_FROM)?;
    select.subquery()
}

fn from_post(resolved: NodeRef, cx: &Cx<'_>) -> ClauseResult<Coerced> {
    if cx.args.deannotate {
        node(deannotate(&resolved))
    } else {
        node(resolved)
    }
}

/// The SELECT behind a FROM element: the element of a subquery or alias of a
/// SELECT, else `SELECT * FROM element`.
fn select_of(from: &NodeRef) -> ClauseResult<NodeRef> {
    match from.kind() {
        NodeKind::Alias { element, .. } | NodeKind::Subquery { element, .. }
            if element.is_select_statement() =>
        {
            Ok(Arc::clone(element))
        }
        _ => from.select(),
    }
}

// ==================== Column expressions ====================

struct ExpressionElementImpl;

impl RoleImpl for ExpressionElementImpl {
    fn role(&self) -> Role {
        Role::ExpressionElement
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        expression_literal(self, input, cx)
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        column_coercions(self, original, resolved, cx)
    }

    fn advice(&self, original: &Input, _resolved: Option<&Coerced>) -> Option<Advice> {
        table_valued_advice(original)
    }
}

struct BinaryElementImpl;

impl RoleImpl for BinaryElementImpl {
    fn role(&self) -> Role {
        Role::BinaryElement
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        match input.to_bind_value() {
            Some(value) => node(bind_against(cx.args.expr.as_ref(), value, false)),
            None => Err(self.expected(input, None, cx)),
        }
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        column_coercions(self, original, resolved, cx)
    }

    fn post_coercion(
        &self,
        resolved: NodeRef,
        _original: &Input,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        let expr_type = cx.args.expr.as_ref().map_or(SqlType::Null, |e| e.sql_type());
        if resolved.sql_type().is_null()
            && !expr_type.is_null()
            && matches!(resolved.kind(), NodeKind::BindParam(_))
        {
            return node(retype(&resolved, expr_type));
        }
        node(resolved)
    }

    fn advice(&self, original: &Input, _resolved: Option<&Coerced>) -> Option<Advice> {
        table_valued_advice(original)
    }
}

struct InElementImpl;

impl InElementImpl {
    fn warn_for_implicit_coercion(from: &NodeRef, cx: &mut Cx<'_>) -> ClauseResult<()> {
        cx.implicit(format!(
            "Coercing {} object into a select() for use in IN(); \
             please pass a select() construct explicitly",
            from.kind_name()
        ))
    }
}

impl RoleImpl for InElementImpl {
    fn role(&self) -> Role {
        Role::InElement
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        let Input::List(items) = input else {
            return Err(self.expected(input, None, cx));
        };
        let expr = cx.args.expr.as_ref();

        let mut has_non_literal = false;
        for item in items {
            match item {
                Input::None => has_non_literal = true,
                Input::Node(n) if n.is_column_element() => has_non_literal = true,
                _ if item.is_literal() => {}
                _ => return Err(self.expected(input, None, cx)),
            }
        }

        if !has_non_literal {
            return match input.to_bind_value() {
                Some(value) => node(bind_against(expr, value, true)),
                None => Err(self.expected(input, None, cx)),
            };
        }

        let mut clauses = Vec::with_capacity(items.len());
        for item in items {
            let clause = match item {
                Input::None => null(),
                Input::Node(n) => Arc::clone(n),
                _ => match item.to_bind_value() {
                    Some(value) => bind_against(expr, value, false),
                    None => return Err(self.expected(input, None, cx)),
                },
            };
            clauses.push(clause);
        }
        node(
            Node::new(NodeKind::ClauseList {
                op: ListOp::Comma,
                clauses,
            })
            .into_ref(),
        )
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        match &resolved {
            Coerced::Node(n) if n.is_from_clause() => {
                Self::warn_for_implicit_coercion(n, cx)?;
                let select = select_of(n)?;
                self.post_coercion(select, original, cx)
            }
            _ => Err(self.expected(original, Some(&resolved), cx)),
        }
    }

    fn post_coercion(
        &self,
        resolved: NodeRef,
        _original: &Input,
        _cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        if resolved.is_select_statement() {
            return node(resolved.scalar_subquery()?);
        }
        match resolved.kind() {
            NodeKind::ClauseList { clauses, .. } => {
                if clauses.is_empty() {
                    return Err(ClauseError::construction("IN() requires at least one element"));
                }
                let type_ = resolved.sql_type();
                node(Node::typed(NodeKind::Grouping(resolved), type_).into_ref())
            }
            NodeKind::BindParam(b) if !b.expanding => {
                let expanding = BindParam {
                    expanding: true,
                    ..b.clone()
                };
                node(Node::typed(NodeKind::BindParam(expanding), resolved.sql_type()).into_ref())
            }
            _ => node(resolved),
        }
    }
}

struct OnClauseImpl;

impl RoleImpl for OnClauseImpl {
    fn role(&self) -> Role {
        Role::OnClause
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        coerce_literals(self, input, Literals::CONSTS, cx, |s, cx| {
            if cx.args.legacy {
                cx.deprecated(STRING_JOIN_TARGET)?;
                Ok(Coerced::Key(s.to_string()))
            } else {
                Err(no_text_error(s, cx))
            }
        })
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        match resolved {
            Coerced::Key(key) if cx.args.legacy => Ok(Coerced::Key(key)),
            other => column_coercions(self, original, other, cx),
        }
    }
}

struct WhereHavingImpl;

impl RoleImpl for WhereHavingImpl {
    fn role(&self) -> Role {
        Role::WhereHaving
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        coerce_literals(self, input, Literals::CONSTS, cx, |s, cx| {
            Err(no_text_error(s, cx))
        })
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        column_coercions(self, original, resolved, cx)
    }
}

struct StatementOptionImpl;

impl RoleImpl for StatementOptionImpl {
    fn role(&self) -> Role {
        Role::StatementOption
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        coerce_literals(self, input, Literals::CONSTS, cx, |s, _| node(text(s)))
    }
}

/// Roles that accept no literal at all.
struct NoTextImpl(Role);

impl RoleImpl for NoTextImpl {
    fn role(&self) -> Role {
        self.0
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        no_text_coercion(self, input, cx)
    }
}

/// Column expressions, or plain strings taken as keys.
struct StringKeyImpl(Role);

impl RoleImpl for StringKeyImpl {
    fn role(&self) -> Role {
        self.0
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        string_key(self, input, cx)
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        returns_string_key(self, original, resolved, cx)
    }
}

struct StrAsPlainColumnImpl;

impl RoleImpl for StrAsPlainColumnImpl {
    fn role(&self) -> Role {
        Role::StrAsPlainColumn
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        coerce_literals(self, input, Literals::default(), cx, |s, _| {
            node(crate::node::column(s))
        })
    }
}

/// GROUP BY / OF: strings name labels of the enclosing SELECT.
struct ByOfImpl(Role);

fn by_of_literal<R: RoleImpl + ?Sized>(
    imp: &R,
    input: &Input,
    cx: &mut Cx<'_>,
) -> ClauseResult<Coerced> {
    coerce_literals(imp, input, Literals::CONSTS, cx, |s, _| {
        node(Node::new(NodeKind::TextualLabelReference(s.to_string())).into_ref())
    })
}

impl RoleImpl for ByOfImpl {
    fn role(&self) -> Role {
        self.0
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        by_of_literal(self, input, cx)
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        column_coercions(self, original, resolved, cx)
    }
}

struct OrderByImpl;

impl RoleImpl for OrderByImpl {
    fn role(&self) -> Role {
        Role::OrderBy
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        by_of_literal(self, input, cx)
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        column_coercions(self, original, resolved, cx)
    }

    fn post_coercion(
        &self,
        resolved: NodeRef,
        _original: &Input,
        _cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        let labelled = match resolved.kind() {
            NodeKind::Label { .. } => true,
            NodeKind::Ordering { element, .. } => {
                matches!(element.kind(), NodeKind::Label { .. })
            }
            _ => false,
        };
        if labelled {
            let type_ = resolved.sql_type();
            return node(Node::typed(NodeKind::LabelReference(resolved), type_).into_ref());
        }
        node(resolved)
    }
}

struct GroupByImpl;

impl RoleImpl for GroupByImpl {
    fn role(&self) -> Role {
        Role::GroupBy
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        by_of_literal(self, input, cx)
    }

    fn implicit_coercion(
        &self,
        _original: &Input,
        resolved: Coerced,
        _cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        match &resolved {
            Coerced::Node(n) if n.is_from_clause() => node(
                Node::new(NodeKind::ClauseList {
                    op: ListOp::Comma,
                    clauses: n.columns(),
                })
                .into_ref(),
            ),
            _ => Ok(resolved),
        }
    }
}

struct DmlColumnImpl;

impl RoleImpl for DmlColumnImpl {
    fn role(&self) -> Role {
        Role::DmlColumn
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        string_key(self, input, cx)
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        returns_string_key(self, original, resolved, cx)
    }

    fn post_coercion(
        &self,
        resolved: NodeRef,
        original: &Input,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        if !cx.args.as_key {
            return node(resolved);
        }
        match resolved.kind() {
            NodeKind::Column(c) => Ok(Coerced::Key(c.name.clone())),
            NodeKind::Label {
                name: Some(name), ..
            } => Ok(Coerced::Key(name.clone())),
            _ => Err(self.expected(original, Some(&Coerced::Node(resolved)), cx)),
        }
    }
}

struct ConstExprImpl;

impl RoleImpl for ConstExprImpl {
    fn role(&self) -> Role {
        Role::ConstExpr
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        match input {
            Input::None => node(null()),
            Input::Bool(true) => node(true_()),
            Input::Bool(false) => node(false_()),
            _ => Err(self.expected(input, None, cx)),
        }
    }
}

struct TruncatedLabelImpl;

impl RoleImpl for TruncatedLabelImpl {
    fn role(&self) -> Role {
        Role::TruncatedLabel
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        string_key(self, input, cx)
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        match original {
            Input::Str(_) => Ok(resolved),
            _ => Err(self.expected(original, Some(&resolved), cx)),
        }
    }
}

struct DdlExpressionImpl;

impl RoleImpl for DdlExpressionImpl {
    fn role(&self) -> Role {
        Role::DdlExpression
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        coerce_literals(self, input, Literals::CONSTS, cx, |s, _| node(text(s)))
    }

    fn post_coercion(
        &self,
        resolved: NodeRef,
        _original: &Input,
        _cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        node(deep_deannotate(&resolved)?)
    }
}

/// Column names for DDL constraints: string keys or de-annotated columns.
struct DdlColumnImpl(Role);

impl RoleImpl for DdlColumnImpl {
    fn role(&self) -> Role {
        self.0
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        string_key(self, input, cx)
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        returns_string_key(self, original, resolved, cx)
    }

    fn post_coercion(
        &self,
        resolved: NodeRef,
        _original: &Input,
        _cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        node(deep_deannotate(&resolved)?)
    }
}

struct LimitOffsetImpl;

impl RoleImpl for LimitOffsetImpl {
    fn role(&self) -> Role {
        Role::LimitOffset
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        let value = match input {
            Input::None => return Ok(Coerced::Empty),
            Input::Int(v) => *v,
            Input::Float(v)
                if v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64 =>
            {
                *v as i64
            }
            Input::Str(s) => match s.trim().parse::<i64>() {
                Ok(v) => v,
                Err(_) => return Err(self.expected(input, None, cx)),
            },
            _ => return Err(self.expected(input, None, cx)),
        };
        node(unique_bind(
            cx.args.name.clone(),
            BindValue::Int(value),
            Some(cx.args.type_.unwrap_or(SqlType::Integer)),
            false,
            false,
        ))
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        match resolved {
            Coerced::Empty => Ok(Coerced::Empty),
            other => Err(self.expected(original, Some(&other), cx)),
        }
    }
}

struct LabeledColumnExprImpl;

impl RoleImpl for LabeledColumnExprImpl {
    fn role(&self) -> Role {
        Role::LabeledColumnExpr
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        expression_literal(self, input, cx)
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        if let Coerced::Node(n) = &resolved {
            if n.is_column_element() {
                return node(n.anon_label());
            }
        }
        match column_coercions(self, original, resolved, cx)? {
            Coerced::Node(n) if n.is_column_element() => node(n.anon_label()),
            other => Err(self.expected(original, Some(&other), cx)),
        }
    }

    fn advice(&self, original: &Input, _resolved: Option<&Coerced>) -> Option<Advice> {
        table_valued_advice(original)
    }
}

// ==================== Statements and row sources ====================

struct ColumnsClauseImpl;

/// `^\w\S*$`: a string that reads like a single column name.
fn looks_like_column_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphanumeric() || first == '_' => {
            chars.all(|c| !c.is_whitespace())
        }
        _ => false,
    }
}

impl RoleImpl for ColumnsClauseImpl {
    fn role(&self) -> Role {
        Role::ColumnsClause
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        let flags = Literals {
            consts: true,
            numerics: true,
            star: true,
        };
        coerce_literals(self, input, flags, cx, |s, cx| {
            let column = Input::Str(ellipses(s)).repr();
            let constructor = if looks_like_column_name(s) {
                "column"
            } else {
                "literal_column"
            };
            Err(ArgumentError::with_message(
                cx.role.name(),
                Input::Str(s.to_string()).repr(),
                cx.argname(),
                format!(
                    "Textual column expression {column} {}should be explicitly declared with \
                     text({column}), or use {constructor}({column}) for more specificity",
                    argname_clause(cx)
                ),
            )
            .into())
        })
    }

    fn advice(&self, original: &Input, resolved: Option<&Coerced>) -> Option<Advice> {
        if let Some(advice) = select_is_not_from(original, resolved) {
            return Some(advice);
        }
        match original {
            Input::List(items) => {
                let inner: Vec<String> = items.iter().map(Input::repr).collect();
                Some((
                    format!("Did you mean to say select({})?", inner.join(", ")),
                    None,
                ))
            }
            _ => None,
        }
    }
}

struct ReturnsRowsImpl;

impl RoleImpl for ReturnsRowsImpl {
    fn role(&self) -> Role {
        Role::ReturnsRows
    }
}

struct StatementImpl;

impl RoleImpl for StatementImpl {
    fn role(&self) -> Role {
        Role::Statement
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        coerce_literals(self, input, Literals::default(), cx, |s, cx| {
            cx.deprecated(PLAIN_STRING_STATEMENT)?;
            node(text(s))
        })
    }
}

struct SelectStatementImpl;

impl RoleImpl for SelectStatementImpl {
    fn role(&self) -> Role {
        Role::SelectStatement
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        no_text_coercion(self, input, cx)
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        match &resolved {
            Coerced::Node(n) if n.is_text() => node(
                Node::new(NodeKind::TextualSelect {
                    text: Arc::clone(n),
                    columns: Vec::new(),
                })
                .into_ref(),
            ),
            _ => Err(self.expected(original, Some(&resolved), cx)),
        }
    }
}

struct JoinTargetImpl;

impl RoleImpl for JoinTargetImpl {
    fn role(&self) -> Role {
        Role::JoinTarget
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        string_key(self, input, cx)
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        if !cx.args.legacy {
            return Err(self.expected(original, Some(&resolved), cx));
        }
        match &resolved {
            Coerced::Key(_) => {
                cx.deprecated(STRING_JOIN_TARGET)?;
                Ok(resolved)
            }
            Coerced::Node(n) if Role::WhereHaving.is_satisfied_by(n) => Ok(resolved),
            Coerced::Node(n) if n.is_select_statement() => node(implicit_subquery(n, cx)?),
            _ => Err(self.expected(original, Some(&resolved), cx)),
        }
    }
}

struct FromClauseImpl;

impl RoleImpl for FromClauseImpl {
    fn role(&self) -> Role {
        Role::FromClause
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        no_text_coercion(self, input, cx)
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        match &resolved {
            Coerced::Node(n) if n.is_select_statement() => {
                if cx.args.explicit_subquery {
                    node(n.subquery()?)
                } else if cx.args.allow_select.unwrap_or(true) {
                    node(implicit_subquery(n, cx)?)
                } else {
                    Err(self.expected(original, Some(&resolved), cx))
                }
            }
            Coerced::Node(n) if n.is_text() => Ok(resolved),
            _ => Err(self.expected(original, Some(&resolved), cx)),
        }
    }

    fn post_coercion(
        &self,
        resolved: NodeRef,
        _original: &Input,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        from_post(resolved, cx)
    }

    fn advice(&self, original: &Input, resolved: Option<&Coerced>) -> Option<Advice> {
        select_is_not_from(original, resolved)
    }
}

/// FROM elements only; a SELECT is wrapped only when `allow_select` is set.
/// The anonymized variant aliases whatever it accepts.
struct StrictFromClauseImpl(Role);

impl RoleImpl for StrictFromClauseImpl {
    fn role(&self) -> Role {
        self.0
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        no_text_coercion(self, input, cx)
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        match &resolved {
            Coerced::Node(n)
                if n.is_select_statement() && cx.args.allow_select.unwrap_or(false) =>
            {
                let subquery = implicit_subquery(n, cx)?;
                if self.0 == Role::AnonymizedFromClause {
                    return self.post_coercion(subquery, original, cx);
                }
                node(subquery)
            }
            _ => Err(self.expected(original, Some(&resolved), cx)),
        }
    }

    fn post_coercion(
        &self,
        resolved: NodeRef,
        _original: &Input,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        if self.0 == Role::AnonymizedFromClause {
            return node(anonymize(
                &resolved,
                cx.args.flat,
                cx.args.alias_name.clone(),
            )?);
        }
        from_post(resolved, cx)
    }

    fn advice(&self, original: &Input, resolved: Option<&Coerced>) -> Option<Advice> {
        select_is_not_from(original, resolved)
    }
}

/// An anonymous alias of `from`; joins are either wrapped in a subquery or,
/// when `flat`, rebuilt from aliases of each side.
fn anonymize(from: &NodeRef, flat: bool, name: Option<String>) -> ClauseResult<NodeRef> {
    match from.kind() {
        NodeKind::Join(_) if flat => Ok(anonymize_join(from)?.0),
        _ => alias_node(from, name),
    }
}

/// Alias every leaf of a join tree and point the ON clauses at the aliases.
/// Returns the rebuilt join plus the (original, alias) pairs of its leaves.
fn anonymize_join(from: &NodeRef) -> ClauseResult<(NodeRef, Vec<(NodeRef, NodeRef)>)> {
    let NodeKind::Join(join) = from.kind() else {
        let alias = alias_node(from, None)?;
        return Ok((Arc::clone(&alias), vec![(Arc::clone(from), alias)]));
    };
    let (left, mut replaced) = anonymize_join(&join.left)?;
    let (right, more) = anonymize_join(&join.right)?;
    replaced.extend(more);
    let on = adapt_columns(&join.on, &replaced)?;
    let rebuilt = Node::new(NodeKind::Join(Join {
        left,
        right,
        on,
        kind: join.kind,
    }))
    .into_ref();
    Ok((rebuilt, replaced))
}

fn adapt_columns(clause: &NodeRef, replaced: &[(NodeRef, NodeRef)]) -> ClauseResult<NodeRef> {
    rewrite(clause, &mut |n: &NodeRef| {
        let NodeKind::Column(col) = n.kind() else {
            return Ok(None);
        };
        let Some(table) = &col.table else {
            return Ok(None);
        };
        Ok(replaced
            .iter()
            .find(|(original, _)| Arc::ptr_eq(original, table))
            .map(|(_, alias)| {
                Node::typed(
                    NodeKind::Column(Column {
                        name: col.name.clone(),
                        table: Some(Arc::clone(alias)),
                        is_literal: col.is_literal,
                    }),
                    n.sql_type(),
                )
                .into_ref()
            }))
    })
}

struct DmlTableImpl;

impl RoleImpl for DmlTableImpl {
    fn role(&self) -> Role {
        Role::DmlTable
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        no_text_coercion(self, input, cx)
    }

    fn advice(&self, original: &Input, resolved: Option<&Coerced>) -> Option<Advice> {
        select_is_not_from(original, resolved)
    }
}

struct DmlSelectImpl;

impl RoleImpl for DmlSelectImpl {
    fn role(&self) -> Role {
        Role::DmlSelect
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        no_text_coercion(self, input, cx)
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        match &resolved {
            Coerced::Node(n) if n.is_from_clause() => node(select_of(n)?),
            _ => Err(self.expected(original, Some(&resolved), cx)),
        }
    }
}

struct CompoundElementImpl;

impl RoleImpl for CompoundElementImpl {
    fn role(&self) -> Role {
        Role::CompoundElement
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        no_text_coercion(self, input, cx)
    }

    fn advice(&self, original: &Input, _resolved: Option<&Coerced>) -> Option<Advice> {
        let from = original.as_node().filter(|n| n.is_from_clause())?;
        let advice = if from.is_aliased() {
            "Use the plain select() object without calling .subquery() or .alias()."
        } else {
            "To SELECT from any FROM clause, use the .select() method."
        };
        Some((advice.to_string(), None))
    }
}

struct LiteralValueImpl;

impl RoleImpl for LiteralValueImpl {
    fn role(&self) -> Role {
        Role::LiteralValue
    }

    fn literal_coercion(&self, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
        match input.to_bind_value() {
            Some(value) => Ok(Coerced::Literal(value)),
            None => Err(self.expected(input, None, cx)),
        }
    }

    fn implicit_coercion(
        &self,
        original: &Input,
        resolved: Coerced,
        cx: &mut Cx<'_>,
    ) -> ClauseResult<Coerced> {
        match resolved {
            Coerced::Literal(value) => {
                node(unique_bind(None, value, cx.args.type_, false, false))
            }
            other => Err(self.expected(original, Some(&other), cx)),
        }
    }
}
