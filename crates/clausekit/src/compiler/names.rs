use crate::node::{BindParam, Node, NodeRef};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Synthetic names for one compilation.
///
/// Anonymous aliases, subqueries and labels get `anon_<n>`; unique bind
/// parameters get `<key>_<n>` (`param_<n>` without a key). Every node keeps
/// the name it got first, and no name collides with an identifier the caller
/// wrote anywhere in the tree.
pub(crate) struct Namer<'a> {
    taken: &'a HashSet<String>,
    issued: HashSet<String>,
    counters: HashMap<String, usize>,
    assigned: HashMap<*const Node, String>,
}

impl<'a> Namer<'a> {
    pub(crate) fn new(taken: &'a HashSet<String>) -> Self {
        Self {
            taken,
            issued: HashSet::new(),
            counters: HashMap::new(),
            assigned: HashMap::new(),
        }
    }

    pub(crate) fn anon(&mut self, node: &NodeRef) -> String {
        self.assign(node, "anon")
    }

    /// Rendered name of a bind parameter.
    pub(crate) fn bind(&mut self, node: &NodeRef, bind: &BindParam) -> String {
        match (&bind.key, bind.unique) {
            (Some(key), false) => key.clone(),
            (Some(key), true) => self.assign(node, key),
            (None, _) => self.assign(node, "param"),
        }
    }

    fn assign(&mut self, node: &NodeRef, prefix: &str) -> String {
        let ptr = Arc::as_ptr(node);
        if let Some(name) = self.assigned.get(&ptr) {
            return name.clone();
        }
        let name = self.fresh(prefix);
        self.assigned.insert(ptr, name.clone());
        name
    }

    fn fresh(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{prefix}_{counter}");
            if !self.taken.contains(&candidate) && !self.issued.contains(&candidate) {
                self.issued.insert(candidate.clone());
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, bindparam, column};

    fn unique(key: Option<&str>) -> NodeRef {
        Node::new(NodeKind::BindParam(BindParam {
            key: key.map(str::to_string),
            value: 1.into(),
            unique: true,
            expanding: false,
            crud: false,
        }))
        .into_ref()
    }

    fn bind_of(node: &NodeRef) -> &BindParam {
        match node.kind() {
            NodeKind::BindParam(b) => b,
            _ => panic!("not a bind parameter"),
        }
    }

    #[test]
    fn names_skip_identifiers_in_use() {
        let taken: HashSet<String> = ["anon_1".to_string(), "id_2".to_string()].into();
        let mut namer = Namer::new(&taken);

        let (a, b) = (column("a"), column("b"));
        assert_eq!(namer.anon(&a), "anon_2");
        assert_eq!(namer.anon(&b), "anon_3");
        assert_eq!(namer.anon(&a), "anon_2");

        let (p, q) = (unique(Some("id")), unique(Some("id")));
        assert_eq!(namer.bind(&p, bind_of(&p)), "id_1");
        assert_eq!(namer.bind(&q, bind_of(&q)), "id_3");
    }

    #[test]
    fn keyed_parameters_keep_their_name() {
        let taken = HashSet::new();
        let mut namer = Namer::new(&taken);
        let p = bindparam("user_id", 5);
        assert_eq!(namer.bind(&p, bind_of(&p)), "user_id");

        let anon = unique(None);
        assert_eq!(namer.bind(&anon, bind_of(&anon)), "param_1");
    }
}
