use crate::dialect::Dialect;
use crate::error::{ClauseError, ClauseResult};
use crate::node::{NodeKind, NodeRef};
use crate::value::ParamList;

/// Piece of a rendered statement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Text(String),
    /// Placeholder for the bind parameter in `slot` of the tree's analysis.
    Bind {
        slot: usize,
        name: String,
        expanding: bool,
    },
}

/// Rendered statement text with bind placeholders left open.
///
/// Templates do not depend on parameter values, so one template serves every
/// tree with the same cache key.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn from_text(sql: &str) -> Self {
        let mut template = Self::new();
        template.push_str(sql);
        template
    }

    pub(crate) fn push_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(Segment::Text(text)) => text.push_str(s),
            _ => self.segments.push(Segment::Text(s.to_string())),
        }
    }

    pub(crate) fn push_bind(&mut self, slot: usize, name: String, expanding: bool) {
        self.segments.push(Segment::Bind {
            slot,
            name,
            expanding,
        });
    }

    /// Fill in placeholders for the bind parameters of one tree, in textual
    /// order.
    pub(crate) fn assemble(
        &self,
        binds: &[NodeRef],
        dialect: &dyn Dialect,
    ) -> ClauseResult<(String, ParamList)> {
        let style = dialect.bind_style();
        let mut sql = String::new();
        let mut params = ParamList::new();

        for segment in &self.segments {
            let (slot, name, expanding) = match segment {
                Segment::Text(text) => {
                    sql.push_str(text);
                    continue;
                }
                Segment::Bind {
                    slot,
                    name,
                    expanding,
                } => (*slot, name.as_str(), *expanding),
            };

            let value = binds
                .get(slot)
                .and_then(|node| match node.kind() {
                    NodeKind::BindParam(bind) => Some(&bind.value),
                    _ => None,
                })
                .ok_or_else(|| {
                    ClauseError::compile(format!("no bind parameter in slot {slot} for '{name}'"))
                })?;

            if !expanding {
                let position = params.push(name, value.clone());
                sql.push_str(&style.placeholder(position, name));
                continue;
            }

            let items = value.expand();
            if items.is_empty() {
                sql.push_str(dialect.empty_set_expr());
                continue;
            }
            sql.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                let item_name = format!("{name}_{}", i + 1);
                let position = params.push(item_name.as_str(), item.clone());
                sql.push_str(&style.placeholder(position, &item_name));
            }
            sql.push(')');
        }

        Ok((sql, params))
    }
}
