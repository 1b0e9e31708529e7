//! Role-driven coercion of caller values into nodes.
//!
//! [`expect`] is the single entry point used by every consumption site. Given
//! a [`Role`] and an [`Input`] it either hands back a node that satisfies the
//! role, a string key (for roles that resolve to keys), or fails with an
//! [`ArgumentError`](crate::ArgumentError) naming the role and the value.
//!
//! Per-role behaviour lives in one [`RoleImpl`](impls::RoleImpl) per role,
//! held by a registry built once on first use.

mod impls;
mod input;

#[cfg(test)]
mod tests;

pub use input::{AsClauseElement, Input, Inspectable, Inspection};

use crate::diagnostics::{Diagnostic, ImplicitPolicy};
use crate::error::{ClauseError, ClauseResult};
use crate::node::{BinaryOp, Node, NodeKind, NodeRef};
use crate::role::Role;
use crate::types::SqlType;
use crate::value::BindValue;
use impls::RoleImpl;
use std::sync::{Arc, LazyLock};

/// Maximum number of [`AsClauseElement`] hops followed before giving up.
pub const MAX_CLAUSE_ELEMENT_DEPTH: usize = 100;

/// What a coercion resolved to.
#[derive(Debug, Clone)]
pub enum Coerced {
    Node(NodeRef),
    /// A string key (DML column keys, label names, legacy join targets).
    Key(String),
    /// Nothing at all (`LIMIT None`).
    Empty,
    /// A plain value passed through unchanged, for the role to wrap.
    Literal(BindValue),
}

impl Coerced {
    pub fn node(&self) -> Option<&NodeRef> {
        match self {
            Coerced::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn into_node(self) -> Option<NodeRef> {
        match self {
            Coerced::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Coerced::Key(k) => Some(k),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Coerced::Empty)
    }

    pub(crate) fn repr(&self) -> String {
        match self {
            Coerced::Node(n) => n.repr(),
            Coerced::Key(k) => format!("'{k}'"),
            Coerced::Empty => "None".to_string(),
            Coerced::Literal(v) => v.to_string(),
        }
    }
}

/// Successful coercion result with the diagnostics it raised.
#[derive(Debug, Clone)]
pub struct Coercion {
    pub value: Coerced,
    pub diagnostics: Vec<Diagnostic>,
}

/// Optional context of a coercion call.
#[derive(Debug, Clone, Default)]
pub struct CoercionArgs {
    pub(crate) argname: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) type_: Option<SqlType>,
    pub(crate) expr: Option<NodeRef>,
    pub(crate) operator: Option<BinaryOp>,
    pub(crate) as_key: bool,
    pub(crate) legacy: bool,
    pub(crate) explicit_subquery: bool,
    pub(crate) allow_select: Option<bool>,
    pub(crate) deannotate: bool,
    pub(crate) flat: bool,
    pub(crate) is_crud: bool,
    pub(crate) alias_name: Option<String>,
    pub(crate) policy: Option<ImplicitPolicy>,
}

impl CoercionArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the argument at the consumption site, quoted in errors.
    pub fn argname(mut self, argname: impl Into<String>) -> Self {
        self.argname = Some(argname.into());
        self
    }

    /// Key given to bound parameters created from literals.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Type given to bound parameters created from literals.
    pub fn type_(mut self, type_: SqlType) -> Self {
        self.type_ = Some(type_);
        self
    }

    /// Left-hand side of the binary expression being built.
    pub fn expr(mut self, expr: NodeRef) -> Self {
        self.expr = Some(expr);
        self
    }

    pub fn operator(mut self, operator: BinaryOp) -> Self {
        self.operator = Some(operator);
        self
    }

    /// Resolve DML column expressions to their string key.
    pub fn as_key(mut self, as_key: bool) -> Self {
        self.as_key = as_key;
        self
    }

    /// Accept historically permitted string forms (join targets, ON clauses).
    pub fn legacy(mut self, legacy: bool) -> Self {
        self.legacy = legacy;
        self
    }

    /// Turn a SELECT into a subquery without a diagnostic.
    pub fn explicit_subquery(mut self, explicit: bool) -> Self {
        self.explicit_subquery = explicit;
        self
    }

    /// Whether a FROM role may wrap a SELECT into an anonymous subquery.
    pub fn allow_select(mut self, allow: bool) -> Self {
        self.allow_select = Some(allow);
        self
    }

    pub fn deannotate(mut self, deannotate: bool) -> Self {
        self.deannotate = deannotate;
        self
    }

    /// Anonymize joins side by side instead of wrapping them in a subquery.
    pub fn flat(mut self, flat: bool) -> Self {
        self.flat = flat;
        self
    }

    /// Mark bound parameters as INSERT/UPDATE values.
    pub fn is_crud(mut self, is_crud: bool) -> Self {
        self.is_crud = is_crud;
        self
    }

    /// Name of the alias produced by anonymizing roles.
    pub fn alias_name(mut self, name: impl Into<String>) -> Self {
        self.alias_name = Some(name.into());
        self
    }

    /// Override the role's implicit-coercion policy.
    pub fn policy(mut self, policy: ImplicitPolicy) -> Self {
        self.policy = Some(policy);
        self
    }
}

/// Per-call state threaded through a role implementation.
pub(crate) struct Cx<'a> {
    pub(crate) role: Role,
    pub(crate) args: &'a CoercionArgs,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Cx<'a> {
    fn new(role: Role, args: &'a CoercionArgs) -> Self {
        Self {
            role,
            args,
            diagnostics: Vec::new(),
        }
    }

    fn policy(&self) -> ImplicitPolicy {
        self.args.policy.unwrap_or(self.role.default_policy())
    }

    fn raise(&mut self, diagnostic: Diagnostic) -> ClauseResult<()> {
        match self.policy() {
            ImplicitPolicy::Silent => Ok(()),
            ImplicitPolicy::Error => Err(ClauseError::Deprecated(diagnostic)),
            ImplicitPolicy::Warn => {
                diagnostic.log();
                self.diagnostics.push(diagnostic);
                Ok(())
            }
        }
    }

    /// Record a backward-compatibility conversion.
    pub(crate) fn deprecated(&mut self, message: impl Into<String>) -> ClauseResult<()> {
        self.raise(Diagnostic::deprecated(self.role.name(), message))
    }

    /// Record a silent promotion of one construct into another.
    pub(crate) fn implicit(&mut self, message: impl Into<String>) -> ClauseResult<()> {
        self.raise(Diagnostic::implicit(self.role.name(), message))
    }

    pub(crate) fn argname(&self) -> Option<&str> {
        self.args.argname.as_deref()
    }
}

static REGISTRY: LazyLock<[&'static dyn RoleImpl; Role::COUNT]> =
    LazyLock::new(|| Role::ALL.map(impls::impl_for));

fn role_impl(role: Role) -> &'static dyn RoleImpl {
    REGISTRY[role as usize]
}

/// Coerce `input` into something satisfying `role`.
pub fn expect(role: Role, input: impl Into<Input>, args: &CoercionArgs) -> ClauseResult<Coercion> {
    let input = input.into();
    let imp = role_impl(role);
    let mut cx = Cx::new(role, args);
    let value = resolve(imp, &input, &mut cx)?;
    Ok(Coercion {
        value,
        diagnostics: cx.diagnostics,
    })
}

/// Shorthand for [`expect`] with `as_key` set, for roles that resolve to keys.
pub fn expect_as_key(
    role: Role,
    input: impl Into<Input>,
    args: &CoercionArgs,
) -> ClauseResult<Coercion> {
    let args = args.clone().as_key(true);
    expect(role, input, &args)
}

fn resolve(imp: &dyn RoleImpl, input: &Input, cx: &mut Cx<'_>) -> ClauseResult<Coerced> {
    let role = cx.role;

    let resolved = match input {
        Input::Lambda(lambda) if role.allows_lambda() => {
            return Ok(Coerced::Node(
                Node::new(NodeKind::Deferred {
                    lambda: lambda.clone(),
                    role,
                })
                .into_ref(),
            ));
        }
        Input::Node(node) if !role.is_literal_only() => Coerced::Node(Arc::clone(node)),
        _ if role.is_literal_only() => imp.literal_coercion(input, cx)?,
        Input::Element(_) => unwrap_clause_element(imp, input, cx)?,
        Input::Mapped(handle) if role.uses_inspection() => match handle.inspect() {
            Some(inspection) => match inspection.clause_element() {
                Some(node) => Coerced::Node(Arc::clone(node)),
                None => return Err(imp.expected(input, None, cx)),
            },
            None => imp.literal_coercion(input, cx)?,
        },
        _ => imp.literal_coercion(input, cx)?,
    };

    match resolved {
        Coerced::Node(node) if role.is_satisfied_by(&node) => imp.post_coercion(node, input, cx),
        other => imp.implicit_coercion(input, other, cx),
    }
}

/// One entry of a column-expression collection (index and constraint columns).
#[derive(Debug, Clone)]
pub struct ColumnExpression {
    pub resolved: Coerced,
    /// First column found in the resolved expression, pre-order.
    pub column: Option<NodeRef>,
    /// The name, when the entry resolved to a string key.
    pub key: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ColumnExpression {
    /// The column if one was found, else the key.
    pub fn element(&self) -> Option<Coerced> {
        match (&self.column, &self.key) {
            (Some(column), _) => Some(Coerced::Node(Arc::clone(column))),
            (None, Some(key)) => Some(Coerced::Key(key.clone())),
            (None, None) => None,
        }
    }
}

/// Coerce each of `inputs` under `role` and locate the column each one names.
pub fn expect_col_expression_collection<I>(
    role: Role,
    inputs: I,
    args: &CoercionArgs,
) -> ClauseResult<Vec<ColumnExpression>>
where
    I: IntoIterator,
    I::Item: Into<Input>,
{
    inputs
        .into_iter()
        .map(|input| {
            let Coercion { value, diagnostics } = expect(role, input, args)?;
            let (column, key) = match &value {
                Coerced::Node(node) => (first_column(node), None),
                Coerced::Key(key) => (None, Some(key.clone())),
                Coerced::Empty | Coerced::Literal(_) => (None, None),
            };
            Ok(ColumnExpression {
                resolved: value,
                column,
                key,
                diagnostics,
            })
        })
        .collect()
}

fn first_column(node: &NodeRef) -> Option<NodeRef> {
    if matches!(node.kind(), NodeKind::Column(_)) {
        return Some(Arc::clone(node));
    }
    node.children().into_iter().find_map(first_column)
}

fn unwrap_clause_element(
    imp: &dyn RoleImpl,
    input: &Input,
    cx: &mut Cx<'_>,
) -> ClauseResult<Coerced> {
    let mut current = input.clone();
    let mut hops = 0;
    while let Input::Element(element) = &current {
        if hops == MAX_CLAUSE_ELEMENT_DEPTH {
            return Err(ClauseError::construction(format!(
                "{} did not resolve to a clause element after {MAX_CLAUSE_ELEMENT_DEPTH} steps",
                input.repr()
            )));
        }
        let next = element.clause_element();
        current = next;
        hops += 1;
    }
    match current {
        Input::Node(node) => Ok(Coerced::Node(node)),
        terminal => Err(imp.expected_resolved(input, terminal.repr(), cx)),
    }
}

/// Coerce to a node; roles that may resolve to keys or nothing are a
/// construction error here.
pub(crate) fn coerce_node(
    role: Role,
    input: Input,
    args: &CoercionArgs,
) -> ClauseResult<(NodeRef, Vec<Diagnostic>)> {
    let Coercion { value, diagnostics } = expect(role, input, args)?;
    match value {
        Coerced::Node(node) => Ok((node, diagnostics)),
        other => Err(ClauseError::construction(format!(
            "{role} resolved to {} where a clause element is required",
            other.repr()
        ))),
    }
}

/// Coerce to a string key: an explicit key, a column name or a label name.
pub(crate) fn coerce_key(
    role: Role,
    input: Input,
    args: &CoercionArgs,
) -> ClauseResult<(String, Vec<Diagnostic>)> {
    let Coercion { value, diagnostics } = expect(role, input, args)?;
    match value {
        Coerced::Key(key) => Ok((key, diagnostics)),
        other => Err(ClauseError::construction(format!(
            "{role} resolved to {} where a string key is required",
            other.repr()
        ))),
    }
}
