//! Structural cache keys.
//!
//! A [`CacheKey`] is the flattened pre-order walk of a tree with every bound
//! value replaced by a slot number. Two trees get equal keys exactly when they
//! render to the same SQL text, whatever values their parameters carry, so
//! the compiler can reuse a rendered template across them.
//!
//! The walk that builds the key also collects what the compiler needs from
//! the whole tree: bind parameters in slot order, the identifiers already in
//! use (so synthetic names can avoid them) and the diagnostics carried by the
//! nodes.

use crate::diagnostics::Diagnostic;
use crate::error::{ClauseError, ClauseResult};
use crate::node::{Node, NodeKind, NodeRef};
use crate::types::SqlType;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Trees whose key would grow past this many elements are not cached.
pub const DEFAULT_MAX_KEY_ELEMENTS: usize = 10_000;

/// One element of a structural key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyElement {
    /// Node variant.
    Kind(&'static str),
    /// Identifier, operator spelling or SQL text.
    Attr(String),
    Flag(bool),
    Type(SqlType),
    /// Number of entries in the following group.
    Count(usize),
    /// Bind parameter slot, in first-seen order.
    Slot(usize),
    /// Ordinal of an anonymous alias, subquery or label.
    Anon(usize),
    /// First occurrence of a FROM element or label.
    Def(usize),
    /// Later occurrence of the element defined under the same ordinal.
    Ref(usize),
    Open(&'static str),
    Close,
    /// A node reached again while it is still being walked.
    Cycle,
}

/// Structure-sensitive fingerprint of a tree, blind to bound values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<KeyElement>);

impl CacheKey {
    pub fn elements(&self) -> &[KeyElement] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Key of `node` under the default size bound; `None` when the tree is too
/// large to cache.
pub fn cache_key(node: &NodeRef) -> Option<CacheKey> {
    analyze(node, DEFAULT_MAX_KEY_ELEMENTS).key
}

/// Everything the compiler learns from one walk over the tree.
#[derive(Debug)]
pub(crate) struct Analysis {
    /// `None` when the tree exceeded the size bound.
    pub(crate) key: Option<CacheKey>,
    /// Bind parameter nodes indexed by slot.
    pub(crate) binds: Vec<NodeRef>,
    slots: HashMap<*const Node, usize>,
    /// Identifiers written by the caller anywhere in the tree.
    pub(crate) identifiers: HashSet<String>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    /// Slot of a bind parameter node of this tree.
    pub(crate) fn slot(&self, node: &NodeRef) -> Option<usize> {
        self.slots.get(&Arc::as_ptr(node)).copied()
    }

    /// Distinct non-unique parameters sharing a name must agree on their value.
    pub(crate) fn check_bind_names(&self) -> ClauseResult<()> {
        let mut by_name: HashMap<&str, &NodeRef> = HashMap::new();
        for node in &self.binds {
            let NodeKind::BindParam(bind) = node.kind() else {
                continue;
            };
            let Some(key) = bind.key.as_deref() else {
                continue;
            };
            if bind.unique {
                continue;
            }
            let Some(existing) = by_name.get(key) else {
                by_name.insert(key, node);
                continue;
            };
            let NodeKind::BindParam(other) = existing.kind() else {
                continue;
            };
            if other.expanding != bind.expanding || other.value != bind.value {
                return Err(ClauseError::compile(format!(
                    "Bind parameter '{key}' conflicts with another bind parameter of the same name"
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn analyze(node: &NodeRef, max_elements: usize) -> Analysis {
    let mut walker = Walker {
        max_elements,
        elements: Vec::new(),
        overflow: false,
        path: HashSet::new(),
        visited: HashSet::new(),
        defs: HashMap::new(),
        anon: 0,
        binds: Vec::new(),
        slots: HashMap::new(),
        identifiers: HashSet::new(),
        diagnostics: Vec::new(),
    };
    walker.walk(node);
    Analysis {
        key: (!walker.overflow).then(|| CacheKey(walker.elements)),
        binds: walker.binds,
        slots: walker.slots,
        identifiers: walker.identifiers,
        diagnostics: walker.diagnostics,
    }
}

struct Walker {
    max_elements: usize,
    elements: Vec<KeyElement>,
    overflow: bool,
    path: HashSet<*const Node>,
    visited: HashSet<*const Node>,
    defs: HashMap<*const Node, usize>,
    anon: usize,
    binds: Vec<NodeRef>,
    slots: HashMap<*const Node, usize>,
    identifiers: HashSet<String>,
    diagnostics: Vec<Diagnostic>,
}

impl Walker {
    fn push(&mut self, element: KeyElement) {
        if self.overflow {
            return;
        }
        if self.elements.len() == self.max_elements {
            self.overflow = true;
            self.elements = Vec::new();
            return;
        }
        self.elements.push(element);
    }

    fn attr(&mut self, value: &str) {
        self.push(KeyElement::Attr(value.to_string()));
    }

    fn ident(&mut self, name: &str) {
        self.identifiers.insert(name.to_string());
        self.attr(name);
    }

    fn group(&mut self, name: &'static str, nodes: &[NodeRef]) {
        self.push(KeyElement::Open(name));
        self.push(KeyElement::Count(nodes.len()));
        for node in nodes {
            self.walk(node);
        }
        self.push(KeyElement::Close);
    }

    fn optional(&mut self, name: &'static str, node: &Option<NodeRef>) {
        self.push(KeyElement::Open(name));
        if let Some(node) = node {
            self.walk(node);
        }
        self.push(KeyElement::Close);
    }

    /// Tables, aliases, subqueries, joins and labels are identified by
    /// pointer: the second time one is reached only its ordinal is recorded.
    fn has_identity(node: &Node) -> bool {
        node.is_from_clause() || matches!(node.kind(), NodeKind::Label { .. })
    }

    fn walk(&mut self, node: &NodeRef) {
        let ptr = Arc::as_ptr(node);
        if self.path.contains(&ptr) {
            self.push(KeyElement::Cycle);
            return;
        }
        if Self::has_identity(node) {
            if let Some(&ordinal) = self.defs.get(&ptr) {
                self.push(KeyElement::Ref(ordinal));
                return;
            }
            let ordinal = self.defs.len();
            self.defs.insert(ptr, ordinal);
            self.push(KeyElement::Def(ordinal));
        }
        if self.visited.insert(ptr) {
            self.diagnostics.extend(node.diagnostics().iter().cloned());
        }

        self.path.insert(ptr);
        self.push(KeyElement::Kind(node.kind_name()));
        self.walk_kind(node);
        self.path.remove(&ptr);
    }

    fn anonymous(&mut self) {
        self.anon += 1;
        self.push(KeyElement::Anon(self.anon));
    }

    fn walk_kind(&mut self, node: &NodeRef) {
        match node.kind() {
            NodeKind::Null | NodeKind::True | NodeKind::False => {}
            NodeKind::BindParam(bind) => {
                let ptr = Arc::as_ptr(node);
                let slot = match self.slots.get(&ptr) {
                    Some(&slot) => slot,
                    None => {
                        let slot = self.binds.len();
                        self.slots.insert(ptr, slot);
                        self.binds.push(Arc::clone(node));
                        slot
                    }
                };
                self.push(KeyElement::Slot(slot));
                match &bind.key {
                    Some(key) => self.ident(key),
                    None => self.push(KeyElement::Flag(false)),
                }
                self.push(KeyElement::Flag(bind.unique));
                self.push(KeyElement::Flag(bind.expanding));
                self.push(KeyElement::Type(node.sql_type()));
            }
            NodeKind::Column(col) => {
                self.ident(&col.name);
                self.push(KeyElement::Flag(col.is_literal));
                self.push(KeyElement::Type(node.sql_type()));
                self.optional("table", &col.table);
            }
            NodeKind::Text(sql) => self.attr(sql),
            NodeKind::TextualSelect { text, columns } => {
                self.push(KeyElement::Count(columns.len()));
                for (name, type_) in columns {
                    self.ident(name);
                    self.push(KeyElement::Type(*type_));
                }
                self.walk(text);
            }
            NodeKind::Unary { op, operand } => {
                self.attr(op.as_sql());
                self.walk(operand);
            }
            NodeKind::Binary { left, op, right } => {
                self.attr(op.as_sql());
                self.walk(left);
                self.walk(right);
            }
            NodeKind::ClauseList { op, clauses } => {
                self.attr(op.separator());
                self.group("clauses", clauses);
            }
            NodeKind::Grouping(inner)
            | NodeKind::LabelReference(inner)
            | NodeKind::ScalarSubquery(inner)
            | NodeKind::TableValued(inner) => self.walk(inner),
            NodeKind::Function { name, args } => {
                self.attr(name);
                self.group("args", args);
            }
            NodeKind::Cast { element, to } => {
                self.push(KeyElement::Type(*to));
                self.walk(element);
            }
            NodeKind::Label { name, element } => {
                match name {
                    Some(name) => self.ident(name),
                    None => self.anonymous(),
                }
                self.walk(element);
            }
            NodeKind::TextualLabelReference(name) => self.ident(name),
            NodeKind::Ordering {
                element,
                descending,
                nulls,
            } => {
                self.push(KeyElement::Flag(*descending));
                match nulls {
                    Some(order) => self.attr(&format!("{order:?}")),
                    None => self.push(KeyElement::Flag(false)),
                }
                self.walk(element);
            }
            NodeKind::Table(table) => {
                self.ident(&table.name);
                match &table.schema {
                    Some(schema) => self.ident(schema),
                    None => self.push(KeyElement::Flag(false)),
                }
                self.push(KeyElement::Count(table.columns.len()));
                for (name, type_) in &table.columns {
                    self.ident(name);
                    self.push(KeyElement::Type(*type_));
                }
            }
            NodeKind::Alias { element, name } | NodeKind::Subquery { element, name } => {
                match name {
                    Some(name) => self.ident(name),
                    None => self.anonymous(),
                }
                self.walk(element);
            }
            NodeKind::Join(join) => {
                self.attr(join.kind.as_sql());
                self.walk(&join.left);
                self.walk(&join.right);
                self.walk(&join.on);
            }
            NodeKind::Select(select) => {
                self.push(KeyElement::Flag(select.distinct));
                self.push(KeyElement::Flag(select.auto_correlate));
                self.group("columns", &select.columns);
                self.group("froms", &select.froms);
                self.optional("where", &select.where_);
                self.group("group_by", &select.group_by);
                self.optional("having", &select.having);
                self.group("order_by", &select.order_by);
                self.optional("limit", &select.limit);
                self.optional("offset", &select.offset);
            }
            NodeKind::Compound { op, selects } => {
                self.attr(op.as_sql());
                self.group("selects", selects);
            }
            NodeKind::Insert(insert) => {
                self.walk(&insert.table);
                self.pairs("values", &insert.values);
                self.push(KeyElement::Open("select"));
                if let Some((columns, select)) = &insert.select {
                    self.push(KeyElement::Count(columns.len()));
                    for column in columns {
                        self.ident(column);
                    }
                    self.walk(select);
                }
                self.push(KeyElement::Close);
                self.group("returning", &insert.returning);
            }
            NodeKind::Update(update) => {
                self.walk(&update.table);
                self.pairs("values", &update.values);
                self.optional("where", &update.where_);
                self.group("returning", &update.returning);
            }
            NodeKind::Delete(delete) => {
                self.walk(&delete.table);
                self.optional("where", &delete.where_);
                self.group("returning", &delete.returning);
            }
            NodeKind::Deferred { lambda, role } => {
                self.attr(&format!("{lambda:?}"));
                self.attr(role.name());
            }
        }
    }

    fn pairs(&mut self, name: &'static str, pairs: &[(String, NodeRef)]) {
        self.push(KeyElement::Open(name));
        self.push(KeyElement::Count(pairs.len()));
        for (key, value) in pairs {
            self.ident(key);
            self.walk(value);
        }
        self.push(KeyElement::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ExprOps, SelectableOps, and_, bindparam, or_, select, table};

    fn users() -> NodeRef {
        table(
            "users",
            &[("id", SqlType::Integer), ("name", SqlType::String)],
        )
    }

    #[test]
    fn literal_values_do_not_change_the_key() {
        let users = users();
        let a = select([&users])
            .unwrap()
            .filter(users.c("id").unwrap().eq(1).unwrap())
            .unwrap()
            .build();
        let b = select([&users])
            .unwrap()
            .filter(users.c("id").unwrap().eq(99).unwrap())
            .unwrap()
            .build();
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn operators_and_order_change_the_key() {
        let users = users();
        let id = users.c("id").unwrap();
        let name = users.c("name").unwrap();

        let eq = id.eq(1).unwrap();
        let lt = id.lt(1).unwrap();
        assert_ne!(cache_key(&eq), cache_key(&lt));

        let ab = and_([id.eq(1).unwrap(), name.eq("x").unwrap()]).unwrap();
        let ba = and_([name.eq("x").unwrap(), id.eq(1).unwrap()]).unwrap();
        assert_ne!(cache_key(&ab), cache_key(&ba));

        let or = or_([id.eq(1).unwrap(), name.eq("x").unwrap()]).unwrap();
        assert_ne!(cache_key(&ab), cache_key(&or));
    }

    #[test]
    fn clause_position_is_part_of_the_key() {
        let users = users();
        let cond = users.c("id").unwrap().gt(1).unwrap();
        let filtered = select([&users]).unwrap().filter(&cond).unwrap().build();
        let having = select([&users]).unwrap().having(&cond).unwrap().build();
        assert_ne!(cache_key(&filtered), cache_key(&having));
    }

    #[test]
    fn shared_bind_keeps_one_slot() {
        let users = users();
        let p = bindparam("p", 5);
        let cond = and_([
            users.c("id").unwrap().eq(&p).unwrap(),
            users.c("id").unwrap().lt(&p).unwrap(),
        ])
        .unwrap();
        let analysis = analyze(&cond, DEFAULT_MAX_KEY_ELEMENTS);
        assert_eq!(analysis.binds.len(), 1);
        assert_eq!(analysis.slot(&p), Some(0));
    }

    #[test]
    fn same_table_object_versus_equal_tables() {
        let users = users();
        let shared = select([users.c("id").unwrap(), users.c("name").unwrap()])
            .unwrap()
            .build();
        let other = self::users();
        let split = select([users.c("id").unwrap(), other.c("name").unwrap()])
            .unwrap()
            .build();
        assert_ne!(cache_key(&shared), cache_key(&split));
    }

    #[test]
    fn oversized_trees_are_uncacheable() {
        let users = users();
        let id = users.c("id").unwrap();
        let clauses: Vec<_> = (0..50).map(|i| id.eq(i).unwrap()).collect();
        let big = or_(clauses).unwrap();

        let analysis = analyze(&big, 20);
        assert!(analysis.key.is_none());
        assert_eq!(analysis.binds.len(), 50);
        assert!(cache_key(&big).is_some());
    }

    #[test]
    fn identifiers_are_collected() {
        let users = users();
        let stmt = select([users.c("id").unwrap().label("anon_1").unwrap()])
            .unwrap()
            .build();
        let analysis = analyze(&stmt, DEFAULT_MAX_KEY_ELEMENTS);
        assert!(analysis.identifiers.contains("anon_1"));
        assert!(analysis.identifiers.contains("users"));
    }

    #[test]
    fn conflicting_bind_names() {
        let users = users();
        let id = users.c("id").unwrap();
        let same = and_([
            id.eq(bindparam("x", 1)).unwrap(),
            id.lt(bindparam("x", 1)).unwrap(),
        ])
        .unwrap();
        assert!(analyze(&same, DEFAULT_MAX_KEY_ELEMENTS).check_bind_names().is_ok());

        let clash = and_([
            id.eq(bindparam("x", 1)).unwrap(),
            id.lt(bindparam("x", 2)).unwrap(),
        ])
        .unwrap();
        let err = analyze(&clash, DEFAULT_MAX_KEY_ELEMENTS)
            .check_bind_names()
            .unwrap_err();
        assert!(err.is_compile());
    }
}
