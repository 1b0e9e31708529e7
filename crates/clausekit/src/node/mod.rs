//! The expression algebra.
//!
//! Every SQL construct is a [`Node`] shared through [`NodeRef`] (`Arc<Node>`).
//! Nodes are immutable once built: transformations go through [`rewrite`],
//! which returns new nodes and shares every untouched child. Trees are
//! acyclic, but a sub-tree may be referenced from several parents.
//!
//! Constructors that accept caller values route them through
//! [`expect`](crate::coercion::expect) with the role of their consumption
//! site, and keep the diagnostics that coercion produced on the node they
//! return.

mod dml;
mod expr;
mod lambda;
mod operators;
mod selectable;

#[cfg(test)]
mod tests;

pub use dml::{DeleteBuilder, InsertBuilder, UpdateBuilder, delete, insert, update};
pub use expr::{
    ExprOps, and_, bindparam, cast, column, column_typed, exists, expanding_bindparam, false_,
    func, literal, literal_column, not_, null, or_, text, true_,
};
pub use lambda::{Lambda, Scope, lambda};
pub use operators::{BinaryOp, JoinKind, ListOp, NullsOrder, SetOp, UnaryOp};
pub use selectable::{
    SelectBuilder, SelectableOps, except, intersect, select, table, table_in_schema, union,
    union_all,
};
pub(crate) use selectable::alias_node;

use crate::diagnostics::Diagnostic;
use crate::error::ClauseResult;
use crate::role::Role;
use crate::types::SqlType;
use crate::value::BindValue;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Shared handle to an immutable node.
pub type NodeRef = Arc<Node>;

/// Opaque metadata carried by a node; never affects rendered SQL.
pub type Annotations = BTreeMap<String, String>;

/// One element of an expression tree.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    type_: SqlType,
    annotations: Annotations,
    diagnostics: Vec<Diagnostic>,
}

/// The closed set of node variants.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Null,
    True,
    False,
    BindParam(BindParam),
    Column(Column),
    /// Literal SQL text, rendered verbatim.
    Text(String),
    /// A text fragment promoted to a row-returning statement.
    TextualSelect {
        text: NodeRef,
        columns: Vec<(String, SqlType)>,
    },
    Unary {
        op: UnaryOp,
        operand: NodeRef,
    },
    Binary {
        left: NodeRef,
        op: BinaryOp,
        right: NodeRef,
    },
    ClauseList {
        op: ListOp,
        clauses: Vec<NodeRef>,
    },
    Grouping(NodeRef),
    Function {
        name: String,
        args: Vec<NodeRef>,
    },
    Cast {
        element: NodeRef,
        to: SqlType,
    },
    /// `element AS name`; an unnamed label gets a synthetic name at compile time.
    Label {
        name: Option<String>,
        element: NodeRef,
    },
    /// Reference to a label (or an ordering of one) from ORDER BY.
    LabelReference(NodeRef),
    /// A bare string in ORDER BY / GROUP BY naming a label of the enclosing SELECT.
    TextualLabelReference(String),
    Ordering {
        element: NodeRef,
        descending: bool,
        nulls: Option<NullsOrder>,
    },
    Table(Table),
    Alias {
        element: NodeRef,
        name: Option<String>,
    },
    Subquery {
        element: NodeRef,
        name: Option<String>,
    },
    ScalarSubquery(NodeRef),
    /// A FROM clause referenced as a whole-row column expression.
    TableValued(NodeRef),
    Join(Join),
    Select(Box<Select>),
    Compound {
        op: SetOp,
        selects: Vec<NodeRef>,
    },
    Insert(Box<Insert>),
    Update(Box<Update>),
    Delete(Box<Delete>),
    /// A lambda resolved at compile time against the compile scope.
    Deferred {
        lambda: Lambda,
        role: Role,
    },
}

#[derive(Debug, Clone)]
pub struct BindParam {
    /// User-facing key; `None` for anonymous parameters.
    pub key: Option<String>,
    pub value: BindValue,
    /// Unique parameters get a fresh `<key>_<n>` name per compilation.
    pub unique: bool,
    /// Renders one placeholder per list element (`IN (...)`).
    pub expanding: bool,
    /// Produced for an INSERT/UPDATE value.
    pub crud: bool,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    /// The FROM element this column belongs to.
    pub table: Option<NodeRef>,
    /// Rendered verbatim instead of as a quoted identifier.
    pub is_literal: bool,
}

#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub schema: Option<String>,
    /// Declared columns; an empty list accepts any column name.
    pub columns: Vec<(String, SqlType)>,
}

#[derive(Debug, Clone)]
pub struct Join {
    pub left: NodeRef,
    pub right: NodeRef,
    pub on: NodeRef,
    pub kind: JoinKind,
}

#[derive(Debug, Clone)]
pub struct Select {
    pub columns: Vec<NodeRef>,
    pub froms: Vec<NodeRef>,
    pub where_: Option<NodeRef>,
    pub group_by: Vec<NodeRef>,
    pub having: Option<NodeRef>,
    pub order_by: Vec<NodeRef>,
    pub limit: Option<NodeRef>,
    pub offset: Option<NodeRef>,
    pub distinct: bool,
    /// Omit FROM entries the enclosing query already provides.
    pub auto_correlate: bool,
}

impl Default for Select {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            froms: Vec::new(),
            where_: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
            auto_correlate: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub table: NodeRef,
    pub values: Vec<(String, NodeRef)>,
    /// `INSERT INTO t (cols) SELECT ...`
    pub select: Option<(Vec<String>, NodeRef)>,
    pub returning: Vec<NodeRef>,
}

#[derive(Debug, Clone)]
pub struct Update {
    pub table: NodeRef,
    pub values: Vec<(String, NodeRef)>,
    pub where_: Option<NodeRef>,
    pub returning: Vec<NodeRef>,
}

#[derive(Debug, Clone)]
pub struct Delete {
    pub table: NodeRef,
    pub where_: Option<NodeRef>,
    pub returning: Vec<NodeRef>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self::typed(kind, SqlType::Null)
    }

    pub(crate) fn typed(kind: NodeKind, type_: SqlType) -> Self {
        Self {
            kind,
            type_,
            annotations: Annotations::new(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics.extend(diagnostics);
        self
    }

    pub(crate) fn into_ref(self) -> NodeRef {
        Arc::new(self)
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The SQL type this node evaluates to.
    pub fn sql_type(&self) -> SqlType {
        self.type_
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Diagnostics raised while this node (not its children) was built.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Name of the node variant, as used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Null => "Null",
            NodeKind::True => "True",
            NodeKind::False => "False",
            NodeKind::BindParam(_) => "BindParameter",
            NodeKind::Column(_) => "Column",
            NodeKind::Text(_) => "TextClause",
            NodeKind::TextualSelect { .. } => "TextualSelect",
            NodeKind::Unary { .. } => "UnaryExpression",
            NodeKind::Binary { .. } => "BinaryExpression",
            NodeKind::ClauseList { .. } => "ClauseList",
            NodeKind::Grouping(_) => "Grouping",
            NodeKind::Function { .. } => "Function",
            NodeKind::Cast { .. } => "Cast",
            NodeKind::Label { .. } => "Label",
            NodeKind::LabelReference(_) => "LabelReference",
            NodeKind::TextualLabelReference(_) => "TextualLabelReference",
            NodeKind::Ordering { .. } => "Ordering",
            NodeKind::Table(_) => "Table",
            NodeKind::Alias { .. } => "Alias",
            NodeKind::Subquery { .. } => "Subquery",
            NodeKind::ScalarSubquery(_) => "ScalarSubquery",
            NodeKind::TableValued(_) => "TableValued",
            NodeKind::Join(_) => "Join",
            NodeKind::Select(_) => "Select",
            NodeKind::Compound { .. } => "CompoundSelect",
            NodeKind::Insert(_) => "Insert",
            NodeKind::Update(_) => "Update",
            NodeKind::Delete(_) => "Delete",
            NodeKind::Deferred { .. } => "Deferred",
        }
    }

    /// Short human-readable representation used in error messages.
    pub fn repr(&self) -> String {
        match &self.kind {
            NodeKind::BindParam(b) => match &b.key {
                Some(key) => format!("BindParameter('{key}', {})", b.value),
                None => format!("BindParameter({})", b.value),
            },
            NodeKind::Column(c) => match c.table.as_deref().and_then(Node::from_name) {
                Some(table) => format!("Column('{}', table='{table}')", c.name),
                None => format!("Column('{}')", c.name),
            },
            NodeKind::Text(t) => format!("TextClause('{}')", ellipses(t)),
            NodeKind::Table(t) => format!("Table('{}')", t.name),
            NodeKind::Alias {
                name: Some(name), ..
            }
            | NodeKind::Subquery {
                name: Some(name), ..
            } => format!("{}('{name}')", self.kind_name()),
            NodeKind::Label {
                name: Some(name), ..
            } => format!("Label('{name}')"),
            NodeKind::Function { name, .. } => format!("Function('{name}')"),
            _ => format!("<{} object>", self.kind_name()),
        }
    }

    /// Value-producing expressions.
    pub fn is_column_element(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Null
                | NodeKind::True
                | NodeKind::False
                | NodeKind::BindParam(_)
                | NodeKind::Column(_)
                | NodeKind::Unary { .. }
                | NodeKind::Binary { .. }
                | NodeKind::ClauseList { .. }
                | NodeKind::Grouping(_)
                | NodeKind::Function { .. }
                | NodeKind::Cast { .. }
                | NodeKind::Label { .. }
                | NodeKind::LabelReference(_)
                | NodeKind::TextualLabelReference(_)
                | NodeKind::Ordering { .. }
                | NodeKind::ScalarSubquery(_)
                | NodeKind::TableValued(_)
        )
    }

    /// Named row sources usable in a FROM list.
    pub fn is_from_clause(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Table(_)
                | NodeKind::Alias { .. }
                | NodeKind::Subquery { .. }
                | NodeKind::Join(_)
        )
    }

    /// SELECT, compound SELECT and textual SELECT.
    pub fn is_select_statement(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Select(_) | NodeKind::Compound { .. } | NodeKind::TextualSelect { .. }
        )
    }

    pub fn is_dml(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Insert(_) | NodeKind::Update(_) | NodeKind::Delete(_)
        )
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.kind, NodeKind::Deferred { .. })
    }

    /// Alias or subquery (anonymous or not).
    pub(crate) fn is_aliased(&self) -> bool {
        matches!(self.kind, NodeKind::Alias { .. } | NodeKind::Subquery { .. })
    }

    /// The name a FROM element is referenced by, when it has a fixed one.
    pub(crate) fn from_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Table(t) => Some(&t.name),
            NodeKind::Alias { name, .. } | NodeKind::Subquery { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    /// Columns this node exports when used as a row source.
    pub fn exported_columns(&self) -> Vec<(String, SqlType)> {
        match &self.kind {
            NodeKind::Table(t) => t.columns.clone(),
            NodeKind::Alias { element, .. } | NodeKind::Subquery { element, .. } => {
                element.exported_columns()
            }
            NodeKind::Join(j) => {
                let mut cols = j.left.exported_columns();
                cols.extend(j.right.exported_columns());
                cols
            }
            NodeKind::TextualSelect { columns, .. } => columns.clone(),
            NodeKind::Compound { selects, .. } => selects
                .first()
                .map(|s| s.exported_columns())
                .unwrap_or_default(),
            NodeKind::Select(s) => s
                .columns
                .iter()
                .flat_map(|c| match &c.kind {
                    NodeKind::Column(col) => vec![(col.name.clone(), c.type_)],
                    NodeKind::Label {
                        name: Some(name), ..
                    } => vec![(name.clone(), c.type_)],
                    _ if c.is_from_clause() => c.exported_columns(),
                    _ => Vec::new(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// A table declared without columns accepts any column name.
    fn has_open_columns(&self) -> bool {
        match &self.kind {
            NodeKind::Table(t) => t.columns.is_empty(),
            NodeKind::Alias { element, .. } => element.has_open_columns(),
            _ => false,
        }
    }

    /// Type of the exported column `name`, or `None` if there is no such column.
    pub(crate) fn column_type(&self, name: &str) -> Option<SqlType> {
        self.exported_columns()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, ty)| ty)
            .or_else(|| self.has_open_columns().then_some(SqlType::Null))
    }

    /// Direct children in positional order.
    pub fn children(&self) -> Vec<&NodeRef> {
        let mut out = Vec::new();
        match &self.kind {
            NodeKind::Null
            | NodeKind::True
            | NodeKind::False
            | NodeKind::BindParam(_)
            | NodeKind::Text(_)
            | NodeKind::TextualLabelReference(_)
            | NodeKind::Table(_)
            | NodeKind::Deferred { .. } => {}
            NodeKind::Column(c) => out.extend(c.table.as_ref()),
            NodeKind::TextualSelect { text, .. } => out.push(text),
            NodeKind::Unary { operand, .. } => out.push(operand),
            NodeKind::Binary { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            NodeKind::ClauseList { clauses, .. } => out.extend(clauses),
            NodeKind::Function { args, .. } => out.extend(args),
            NodeKind::Compound { selects, .. } => out.extend(selects),
            NodeKind::Grouping(e)
            | NodeKind::LabelReference(e)
            | NodeKind::ScalarSubquery(e)
            | NodeKind::TableValued(e)
            | NodeKind::Cast { element: e, .. }
            | NodeKind::Label { element: e, .. }
            | NodeKind::Ordering { element: e, .. }
            | NodeKind::Alias { element: e, .. }
            | NodeKind::Subquery { element: e, .. } => out.push(e),
            NodeKind::Join(j) => {
                out.push(&j.left);
                out.push(&j.right);
                out.push(&j.on);
            }
            NodeKind::Select(s) => {
                out.extend(&s.columns);
                out.extend(&s.froms);
                out.extend(&s.where_);
                out.extend(&s.group_by);
                out.extend(&s.having);
                out.extend(&s.order_by);
                out.extend(&s.limit);
                out.extend(&s.offset);
            }
            NodeKind::Insert(i) => {
                out.push(&i.table);
                out.extend(i.values.iter().map(|(_, v)| v));
                out.extend(i.select.as_ref().map(|(_, s)| s));
                out.extend(&i.returning);
            }
            NodeKind::Update(u) => {
                out.push(&u.table);
                out.extend(u.values.iter().map(|(_, v)| v));
                out.extend(&u.where_);
                out.extend(&u.returning);
            }
            NodeKind::Delete(d) => {
                out.push(&d.table);
                out.extend(&d.where_);
                out.extend(&d.returning);
            }
        }
        out
    }

    /// Rebuild this node with every child replaced by `f(child)`.
    ///
    /// Returns `None` when `f` handed back every child unchanged.
    pub(crate) fn map_children(
        &self,
        f: &mut dyn FnMut(&NodeRef) -> ClauseResult<NodeRef>,
    ) -> ClauseResult<Option<Node>> {
        let mut m = Mapper { f, changed: false };
        let kind = match &self.kind {
            NodeKind::Null
            | NodeKind::True
            | NodeKind::False
            | NodeKind::BindParam(_)
            | NodeKind::Text(_)
            | NodeKind::TextualLabelReference(_)
            | NodeKind::Table(_)
            | NodeKind::Deferred { .. } => return Ok(None),
            NodeKind::Column(c) => NodeKind::Column(Column {
                name: c.name.clone(),
                table: m.opt(&c.table)?,
                is_literal: c.is_literal,
            }),
            NodeKind::TextualSelect { text, columns } => NodeKind::TextualSelect {
                text: m.one(text)?,
                columns: columns.clone(),
            },
            NodeKind::Unary { op, operand } => NodeKind::Unary {
                op: *op,
                operand: m.one(operand)?,
            },
            NodeKind::Binary { left, op, right } => NodeKind::Binary {
                left: m.one(left)?,
                op: *op,
                right: m.one(right)?,
            },
            NodeKind::ClauseList { op, clauses } => NodeKind::ClauseList {
                op: *op,
                clauses: m.many(clauses)?,
            },
            NodeKind::Grouping(e) => NodeKind::Grouping(m.one(e)?),
            NodeKind::Function { name, args } => NodeKind::Function {
                name: name.clone(),
                args: m.many(args)?,
            },
            NodeKind::Cast { element, to } => NodeKind::Cast {
                element: m.one(element)?,
                to: *to,
            },
            NodeKind::Label { name, element } => NodeKind::Label {
                name: name.clone(),
                element: m.one(element)?,
            },
            NodeKind::LabelReference(e) => NodeKind::LabelReference(m.one(e)?),
            NodeKind::Ordering {
                element,
                descending,
                nulls,
            } => NodeKind::Ordering {
                element: m.one(element)?,
                descending: *descending,
                nulls: *nulls,
            },
            NodeKind::Alias { element, name } => NodeKind::Alias {
                element: m.one(element)?,
                name: name.clone(),
            },
            NodeKind::Subquery { element, name } => NodeKind::Subquery {
                element: m.one(element)?,
                name: name.clone(),
            },
            NodeKind::ScalarSubquery(e) => NodeKind::ScalarSubquery(m.one(e)?),
            NodeKind::TableValued(e) => NodeKind::TableValued(m.one(e)?),
            NodeKind::Join(j) => NodeKind::Join(Join {
                left: m.one(&j.left)?,
                right: m.one(&j.right)?,
                on: m.one(&j.on)?,
                kind: j.kind,
            }),
            NodeKind::Select(s) => NodeKind::Select(Box::new(Select {
                columns: m.many(&s.columns)?,
                froms: m.many(&s.froms)?,
                where_: m.opt(&s.where_)?,
                group_by: m.many(&s.group_by)?,
                having: m.opt(&s.having)?,
                order_by: m.many(&s.order_by)?,
                limit: m.opt(&s.limit)?,
                offset: m.opt(&s.offset)?,
                distinct: s.distinct,
                auto_correlate: s.auto_correlate,
            })),
            NodeKind::Compound { op, selects } => NodeKind::Compound {
                op: *op,
                selects: m.many(selects)?,
            },
            NodeKind::Insert(i) => NodeKind::Insert(Box::new(Insert {
                table: m.one(&i.table)?,
                values: m.pairs(&i.values)?,
                select: match &i.select {
                    Some((cols, s)) => Some((cols.clone(), m.one(s)?)),
                    None => None,
                },
                returning: m.many(&i.returning)?,
            })),
            NodeKind::Update(u) => NodeKind::Update(Box::new(Update {
                table: m.one(&u.table)?,
                values: m.pairs(&u.values)?,
                where_: m.opt(&u.where_)?,
                returning: m.many(&u.returning)?,
            })),
            NodeKind::Delete(d) => NodeKind::Delete(Box::new(Delete {
                table: m.one(&d.table)?,
                where_: m.opt(&d.where_)?,
                returning: m.many(&d.returning)?,
            })),
        };

        if !m.changed {
            return Ok(None);
        }
        Ok(Some(Node {
            kind,
            type_: self.type_,
            annotations: self.annotations.clone(),
            diagnostics: self.diagnostics.clone(),
        }))
    }
}

struct Mapper<'a> {
    f: &'a mut dyn FnMut(&NodeRef) -> ClauseResult<NodeRef>,
    changed: bool,
}

impl Mapper<'_> {
    fn one(&mut self, node: &NodeRef) -> ClauseResult<NodeRef> {
        let out = (self.f)(node)?;
        if !Arc::ptr_eq(&out, node) {
            self.changed = true;
        }
        Ok(out)
    }

    fn opt(&mut self, node: &Option<NodeRef>) -> ClauseResult<Option<NodeRef>> {
        node.as_ref().map(|n| self.one(n)).transpose()
    }

    fn many(&mut self, nodes: &[NodeRef]) -> ClauseResult<Vec<NodeRef>> {
        nodes.iter().map(|n| self.one(n)).collect()
    }

    fn pairs(&mut self, pairs: &[(String, NodeRef)]) -> ClauseResult<Vec<(String, NodeRef)>> {
        pairs
            .iter()
            .map(|(k, v)| Ok((k.clone(), self.one(v)?)))
            .collect()
    }
}

/// Rewrite a tree top-down.
///
/// `f` is offered every node before its children; returning `Some` replaces
/// that sub-tree without descending into it. Nodes reachable through several
/// parents are rewritten once, so shared sub-trees stay shared.
pub fn rewrite<F>(node: &NodeRef, f: &mut F) -> ClauseResult<NodeRef>
where
    F: FnMut(&NodeRef) -> ClauseResult<Option<NodeRef>>,
{
    let mut memo = HashMap::new();
    rewrite_inner(node, f, &mut memo)
}

fn rewrite_inner<F>(
    node: &NodeRef,
    f: &mut F,
    memo: &mut HashMap<*const Node, NodeRef>,
) -> ClauseResult<NodeRef>
where
    F: FnMut(&NodeRef) -> ClauseResult<Option<NodeRef>>,
{
    let ptr = Arc::as_ptr(node);
    if let Some(done) = memo.get(&ptr) {
        return Ok(Arc::clone(done));
    }

    let out = match f(node)? {
        Some(replacement) => replacement,
        None => match node.map_children(&mut |child| rewrite_inner(child, &mut *f, &mut *memo))? {
            Some(rebuilt) => rebuilt.into_ref(),
            None => Arc::clone(node),
        },
    };
    memo.insert(ptr, Arc::clone(&out));
    Ok(out)
}

/// Copy of `node` with one more annotation.
pub fn annotate(node: &NodeRef, key: impl Into<String>, value: impl Into<String>) -> NodeRef {
    let mut copy = (**node).clone();
    copy.annotations.insert(key.into(), value.into());
    copy.into_ref()
}

/// `node` without its own annotations; children are left alone.
pub fn deannotate(node: &NodeRef) -> NodeRef {
    if node.annotations.is_empty() {
        return Arc::clone(node);
    }
    let mut copy = (**node).clone();
    copy.annotations.clear();
    copy.into_ref()
}

/// `node` and every descendant stripped of annotations.
pub fn deep_deannotate(node: &NodeRef) -> ClauseResult<NodeRef> {
    fn strip(node: &NodeRef, memo: &mut HashMap<*const Node, NodeRef>) -> ClauseResult<NodeRef> {
        let ptr = Arc::as_ptr(node);
        if let Some(done) = memo.get(&ptr) {
            return Ok(Arc::clone(done));
        }
        let out = match node.map_children(&mut |c| strip(c, &mut *memo))? {
            Some(mut rebuilt) => {
                rebuilt.annotations.clear();
                rebuilt.into_ref()
            }
            None => deannotate(node),
        };
        memo.insert(ptr, Arc::clone(&out));
        Ok(out)
    }

    strip(node, &mut HashMap::new())
}

/// Copy of `node` carrying a different type tag.
pub(crate) fn retype(node: &NodeRef, type_: SqlType) -> NodeRef {
    if node.type_ == type_ {
        return Arc::clone(node);
    }
    let mut copy = (**node).clone();
    copy.type_ = type_;
    copy.into_ref()
}

fn ellipses(s: &str) -> String {
    const MAX: usize = 100;
    if s.chars().count() <= MAX {
        s.to_string()
    } else {
        let head: String = s.chars().take(MAX).collect();
        format!("{head}...")
    }
}
