//! Tables, aliases, subqueries, joins and SELECT construction.

use super::{Column, Join, JoinKind, ListOp, Node, NodeKind, NodeRef, Select, SetOp, Table};
use crate::coercion::{CoercionArgs, Input, coerce_node};
use crate::diagnostics::Diagnostic;
use crate::error::{ClauseError, ClauseResult};
use crate::role::Role;
use crate::types::SqlType;
use std::sync::Arc;

/// A table with declared columns.
///
/// A table declared with no columns accepts any column name in [`SelectableOps::c`].
pub fn table(name: impl Into<String>, columns: &[(&str, SqlType)]) -> NodeRef {
    table_node(name.into(), None, columns)
}

pub fn table_in_schema(
    schema: impl Into<String>,
    name: impl Into<String>,
    columns: &[(&str, SqlType)],
) -> NodeRef {
    table_node(name.into(), Some(schema.into()), columns)
}

fn table_node(name: String, schema: Option<String>, columns: &[(&str, SqlType)]) -> NodeRef {
    Node::new(NodeKind::Table(Table {
        name,
        schema,
        columns: columns
            .iter()
            .map(|(n, ty)| ((*n).to_string(), *ty))
            .collect(),
    }))
    .into_ref()
}

/// Operations on row sources (tables, aliases, subqueries, joins, SELECTs).
pub trait SelectableOps {
    /// The exported column `name`, bound to this row source.
    fn c(&self, name: &str) -> ClauseResult<NodeRef>;
    /// Every declared column, bound to this row source.
    fn columns(&self) -> Vec<NodeRef>;
    /// An anonymous subquery of this SELECT.
    fn subquery(&self) -> ClauseResult<NodeRef>;
    fn subquery_named(&self, name: impl Into<String>) -> ClauseResult<NodeRef>;
    fn alias(&self, name: impl Into<String>) -> ClauseResult<NodeRef>;
    /// An alias whose name is assigned at compile time.
    fn anon_alias(&self) -> ClauseResult<NodeRef>;
    fn scalar_subquery(&self) -> ClauseResult<NodeRef>;
    /// The whole row of this FROM element as a column expression.
    fn table_valued(&self) -> ClauseResult<NodeRef>;
    /// `SELECT <all columns> FROM self`.
    fn select(&self) -> ClauseResult<NodeRef>;
    fn join(&self, target: impl Into<Input>, on: impl Into<Input>) -> ClauseResult<NodeRef>;
    fn outerjoin(&self, target: impl Into<Input>, on: impl Into<Input>) -> ClauseResult<NodeRef>;
}

impl SelectableOps for NodeRef {
    fn c(&self, name: &str) -> ClauseResult<NodeRef> {
        if let NodeKind::Join(j) = self.kind() {
            return j.left.c(name).or_else(|_| j.right.c(name));
        }
        if !self.is_from_clause() {
            return Err(ClauseError::construction(format!(
                "{} has no column collection; call .subquery() first",
                self.repr()
            )));
        }
        let Some(type_) = self.column_type(name) else {
            return Err(ClauseError::construction(format!(
                "{} has no column '{name}'",
                self.repr()
            )));
        };
        Ok(bound_column(self, name, type_))
    }

    fn columns(&self) -> Vec<NodeRef> {
        match self.kind() {
            NodeKind::Join(j) => {
                let mut cols = j.left.columns();
                cols.extend(j.right.columns());
                cols
            }
            _ if self.is_from_clause() => self
                .exported_columns()
                .into_iter()
                .map(|(name, ty)| bound_column(self, &name, ty))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn subquery(&self) -> ClauseResult<NodeRef> {
        subquery_node(self, None)
    }

    fn subquery_named(&self, name: impl Into<String>) -> ClauseResult<NodeRef> {
        subquery_node(self, Some(name.into()))
    }

    fn alias(&self, name: impl Into<String>) -> ClauseResult<NodeRef> {
        alias_node(self, Some(name.into()))
    }

    fn anon_alias(&self) -> ClauseResult<NodeRef> {
        alias_node(self, None)
    }

    fn scalar_subquery(&self) -> ClauseResult<NodeRef> {
        if !self.is_select_statement() {
            return Err(ClauseError::construction(format!(
                "scalar_subquery() requires a SELECT construct, got {}",
                self.repr()
            )));
        }
        Ok(Node::typed(
            NodeKind::ScalarSubquery(Arc::clone(self)),
            first_column_type(self),
        )
        .into_ref())
    }

    fn table_valued(&self) -> ClauseResult<NodeRef> {
        if !self.is_from_clause() {
            return Err(ClauseError::construction(format!(
                "table_valued() requires a FROM clause, got {}",
                self.repr()
            )));
        }
        Ok(Node::new(NodeKind::TableValued(Arc::clone(self))).into_ref())
    }

    fn select(&self) -> ClauseResult<NodeRef> {
        if !self.is_from_clause() {
            return Err(ClauseError::construction(format!(
                "select() requires a FROM clause, got {}",
                self.repr()
            )));
        }
        Ok(select_all(self))
    }

    fn join(&self, target: impl Into<Input>, on: impl Into<Input>) -> ClauseResult<NodeRef> {
        join_node(self, target.into(), on.into(), JoinKind::Inner)
    }

    fn outerjoin(&self, target: impl Into<Input>, on: impl Into<Input>) -> ClauseResult<NodeRef> {
        join_node(self, target.into(), on.into(), JoinKind::Left)
    }
}

fn bound_column(from: &NodeRef, name: &str, type_: SqlType) -> NodeRef {
    Node::typed(
        NodeKind::Column(Column {
            name: name.to_string(),
            table: Some(Arc::clone(from)),
            is_literal: false,
        }),
        type_,
    )
    .into_ref()
}

pub(crate) fn select_all(from: &NodeRef) -> NodeRef {
    Node::new(NodeKind::Select(Box::new(Select {
        columns: vec![Arc::clone(from)],
        froms: vec![Arc::clone(from)],
        ..Select::default()
    })))
    .into_ref()
}

fn first_column_type(node: &NodeRef) -> SqlType {
    match node.kind() {
        NodeKind::Select(s) => s
            .columns
            .first()
            .map(|c| {
                if c.is_from_clause() {
                    c.exported_columns()
                        .first()
                        .map_or(SqlType::Null, |(_, ty)| *ty)
                } else {
                    c.sql_type()
                }
            })
            .unwrap_or_default(),
        NodeKind::Compound { selects, .. } => {
            selects.first().map(first_column_type).unwrap_or_default()
        }
        NodeKind::TextualSelect { columns, .. } => {
            columns.first().map_or(SqlType::Null, |(_, ty)| *ty)
        }
        _ => SqlType::Null,
    }
}

pub(crate) fn subquery_node(node: &NodeRef, name: Option<String>) -> ClauseResult<NodeRef> {
    if !node.is_select_statement() {
        return Err(ClauseError::construction(format!(
            "subquery() requires a SELECT construct, got {}",
            node.repr()
        )));
    }
    Ok(Node::new(NodeKind::Subquery {
        element: Arc::clone(node),
        name,
    })
    .into_ref())
}

pub(crate) fn alias_node(node: &NodeRef, name: Option<String>) -> ClauseResult<NodeRef> {
    let kind = match node.kind() {
        NodeKind::Table(_) => NodeKind::Alias {
            element: Arc::clone(node),
            name,
        },
        NodeKind::Alias { element, .. } => NodeKind::Alias {
            element: Arc::clone(element),
            name,
        },
        NodeKind::Subquery { element, .. } => NodeKind::Subquery {
            element: Arc::clone(element),
            name,
        },
        NodeKind::Join(_) => NodeKind::Subquery {
            element: select_all(node),
            name,
        },
        _ if node.is_select_statement() => NodeKind::Subquery {
            element: Arc::clone(node),
            name,
        },
        _ => {
            return Err(ClauseError::construction(format!(
                "{} cannot be aliased",
                node.repr()
            )));
        }
    };
    Ok(Node::new(kind).into_ref())
}

fn join_node(left: &NodeRef, target: Input, on: Input, kind: JoinKind) -> ClauseResult<NodeRef> {
    if !left.is_from_clause() {
        return Err(ClauseError::construction(format!(
            "join() requires a FROM clause on the left, got {}",
            left.repr()
        )));
    }
    let (right, mut diagnostics) = coerce_node(
        Role::JoinTarget,
        target,
        &CoercionArgs::new().argname("target"),
    )?;
    let (on, diags) = coerce_node(
        Role::OnClause,
        on,
        &CoercionArgs::new().argname("onclause"),
    )?;
    diagnostics.extend(diags);
    Ok(Node::new(NodeKind::Join(Join {
        left: Arc::clone(left),
        right,
        on,
        kind,
    }))
    .with_diagnostics(diagnostics)
    .into_ref())
}

/// Start a SELECT with the given column expressions.
pub fn select<I, T>(columns: I) -> ClauseResult<SelectBuilder>
where
    I: IntoIterator<Item = T>,
    T: Into<Input>,
{
    SelectBuilder::new().columns(columns)
}

/// Generative SELECT builder; [`build`](SelectBuilder::build) produces the node.
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    select: Select,
    diagnostics: Vec<Diagnostic>,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue building from an existing SELECT node.
    pub fn from_node(node: &NodeRef) -> ClauseResult<Self> {
        match node.kind() {
            NodeKind::Select(s) => Ok(Self {
                select: (**s).clone(),
                diagnostics: node.diagnostics().to_vec(),
            }),
            _ => Err(ClauseError::construction(format!(
                "expected a Select, got {}",
                node.repr()
            ))),
        }
    }

    fn coerce(&mut self, role: Role, input: Input, argname: &str) -> ClauseResult<NodeRef> {
        let (node, diagnostics) =
            coerce_node(role, input, &CoercionArgs::new().argname(argname))?;
        self.diagnostics.extend(diagnostics);
        Ok(node)
    }

    pub fn column(mut self, column: impl Into<Input>) -> ClauseResult<Self> {
        let node = self.coerce(Role::ColumnsClause, column.into(), "columns")?;
        self.select.columns.push(node);
        Ok(self)
    }

    pub fn columns<I, T>(mut self, columns: I) -> ClauseResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Input>,
    {
        for column in columns {
            self = self.column(column)?;
        }
        Ok(self)
    }

    pub fn from(mut self, from: impl Into<Input>) -> ClauseResult<Self> {
        let node = self.coerce(Role::FromClause, from.into(), "from")?;
        self.select.froms.push(node);
        Ok(self)
    }

    /// Join `target` onto the most recent FROM element.
    ///
    /// With no explicit FROM yet, the left side is the table of the first
    /// column expression.
    pub fn join(self, target: impl Into<Input>, on: impl Into<Input>) -> ClauseResult<Self> {
        self.join_kind(target.into(), on.into(), JoinKind::Inner)
    }

    pub fn outerjoin(self, target: impl Into<Input>, on: impl Into<Input>) -> ClauseResult<Self> {
        self.join_kind(target.into(), on.into(), JoinKind::Left)
    }

    pub fn full_join(self, target: impl Into<Input>, on: impl Into<Input>) -> ClauseResult<Self> {
        self.join_kind(target.into(), on.into(), JoinKind::Full)
    }

    fn join_kind(mut self, target: Input, on: Input, kind: JoinKind) -> ClauseResult<Self> {
        let left = match self.select.froms.pop() {
            Some(left) => left,
            None => self.leftmost_table().ok_or_else(|| {
                ClauseError::construction("no FROM clause to join from")
            })?,
        };
        let join = join_node(&left, target, on, kind)?;
        self.select.froms.push(join);
        Ok(self)
    }

    fn leftmost_table(&self) -> Option<NodeRef> {
        self.select.columns.iter().find_map(|c| match c.kind() {
            NodeKind::Column(col) => col.table.clone(),
            _ if c.is_from_clause() => Some(Arc::clone(c)),
            _ => None,
        })
    }

    /// Add a WHERE criterion; repeated calls are AND-ed.
    pub fn filter(mut self, clause: impl Into<Input>) -> ClauseResult<Self> {
        let node = self.coerce(Role::WhereHaving, clause.into(), "whereclause")?;
        self.select.where_ = Some(conjoin(self.select.where_.take(), node));
        Ok(self)
    }

    pub fn having(mut self, clause: impl Into<Input>) -> ClauseResult<Self> {
        let node = self.coerce(Role::WhereHaving, clause.into(), "having")?;
        self.select.having = Some(conjoin(self.select.having.take(), node));
        Ok(self)
    }

    pub fn group_by<I, T>(mut self, clauses: I) -> ClauseResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Input>,
    {
        for clause in clauses {
            let node = self.coerce(Role::GroupBy, clause.into(), "group_by")?;
            self.select.group_by.push(node);
        }
        Ok(self)
    }

    pub fn order_by<I, T>(mut self, clauses: I) -> ClauseResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Input>,
    {
        for clause in clauses {
            let node = self.coerce(Role::OrderBy, clause.into(), "order_by")?;
            self.select.order_by.push(node);
        }
        Ok(self)
    }

    pub fn limit(mut self, limit: impl Into<Input>) -> ClauseResult<Self> {
        self.select.limit = self.paging(limit.into(), "limit")?;
        Ok(self)
    }

    pub fn offset(mut self, offset: impl Into<Input>) -> ClauseResult<Self> {
        self.select.offset = self.paging(offset.into(), "offset")?;
        Ok(self)
    }

    fn paging(&mut self, input: Input, name: &str) -> ClauseResult<Option<NodeRef>> {
        let args = CoercionArgs::new().argname(name);
        let coercion = crate::coercion::expect(Role::LimitOffset, input, &args)?;
        self.diagnostics.extend(coercion.diagnostics);
        Ok(coercion.value.into_node())
    }

    pub fn distinct(mut self) -> Self {
        self.select.distinct = true;
        self
    }

    /// Disable automatic correlation against enclosing queries.
    pub fn correlate(mut self, enabled: bool) -> Self {
        self.select.auto_correlate = enabled;
        self
    }

    pub fn build(self) -> NodeRef {
        Node::new(NodeKind::Select(Box::new(self.select)))
            .with_diagnostics(self.diagnostics)
            .into_ref()
    }
}

pub(crate) fn conjoin(existing: Option<NodeRef>, clause: NodeRef) -> NodeRef {
    match existing {
        None => clause,
        Some(prev) => {
            let mut clauses = match prev.kind() {
                NodeKind::ClauseList {
                    op: ListOp::And,
                    clauses,
                } => clauses.clone(),
                _ => vec![prev],
            };
            clauses.push(clause);
            Node::typed(
                NodeKind::ClauseList {
                    op: ListOp::And,
                    clauses,
                },
                SqlType::Boolean,
            )
            .into_ref()
        }
    }
}

fn compound<I, T>(op: SetOp, selects: I) -> ClauseResult<NodeRef>
where
    I: IntoIterator<Item = T>,
    T: Into<Input>,
{
    let args = CoercionArgs::new().argname("selects");
    let mut nodes = Vec::new();
    let mut diagnostics = Vec::new();
    for select in selects {
        let (node, diags) = coerce_node(Role::CompoundElement, select.into(), &args)?;
        diagnostics.extend(diags);
        nodes.push(node);
    }
    if nodes.is_empty() {
        return Err(ClauseError::construction(format!(
            "{} requires at least one SELECT",
            op.as_sql()
        )));
    }
    Ok(Node::new(NodeKind::Compound { op, selects: nodes })
        .with_diagnostics(diagnostics)
        .into_ref())
}

pub fn union<I, T>(selects: I) -> ClauseResult<NodeRef>
where
    I: IntoIterator<Item = T>,
    T: Into<Input>,
{
    compound(SetOp::Union, selects)
}

pub fn union_all<I, T>(selects: I) -> ClauseResult<NodeRef>
where
    I: IntoIterator<Item = T>,
    T: Into<Input>,
{
    compound(SetOp::UnionAll, selects)
}

pub fn intersect<I, T>(selects: I) -> ClauseResult<NodeRef>
where
    I: IntoIterator<Item = T>,
    T: Into<Input>,
{
    compound(SetOp::Intersect, selects)
}

pub fn except<I, T>(selects: I) -> ClauseResult<NodeRef>
where
    I: IntoIterator<Item = T>,
    T: Into<Input>,
{
    compound(SetOp::Except, selects)
}
