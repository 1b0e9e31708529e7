//! Tree to template rendering.
//!
//! The renderer walks a resolved tree once and writes SQL text into a
//! [`Template`], leaving a placeholder segment per bind parameter. Everything
//! it consults is either the tree, the [`Analysis`] of that tree, or the
//! dialect, so the output is a pure function of the cache key and dialect.

use super::names::Namer;
use super::template::Template;
use crate::cache_key::Analysis;
use crate::dialect::{BindStyle, Dialect, Operator, Paging};
use crate::error::{ClauseError, ClauseResult};
use crate::node::{
    BinaryOp, BindParam, Column, Delete, Insert, ListOp, Node, NodeKind, NodeRef, NullsOrder,
    Select, SelectableOps, SetOp, UnaryOp, Update,
};
use std::collections::HashSet;
use std::sync::Arc;

pub(crate) fn render(
    node: &NodeRef,
    dialect: &dyn Dialect,
    analysis: &Analysis,
    literal_binds: bool,
) -> ClauseResult<Template> {
    let mut renderer = Renderer {
        dialect,
        analysis,
        namer: Namer::new(&analysis.identifiers),
        out: Template::new(),
        literal_binds,
        double_percents: dialect.bind_style() == BindStyle::Format,
        frames: Vec::new(),
    };
    renderer.statement(node)?;
    Ok(renderer.out)
}

/// What an enclosing statement offers to the statements nested in it.
#[derive(Default)]
struct Frame {
    /// FROM elements in scope, members of joins included.
    provides: HashSet<*const Node>,
    /// Columns clause, for ORDER BY / GROUP BY label resolution.
    columns: Vec<NodeRef>,
}

impl Frame {
    fn provide(&mut self, from: &NodeRef) {
        self.provides.insert(Arc::as_ptr(from));
        if let NodeKind::Join(join) = from.kind() {
            self.provide(&join.left);
            self.provide(&join.right);
        }
    }
}

struct Renderer<'a> {
    dialect: &'a dyn Dialect,
    analysis: &'a Analysis,
    namer: Namer<'a>,
    out: Template,
    literal_binds: bool,
    /// `%` is the placeholder escape under the `%s` style.
    double_percents: bool,
    frames: Vec<Frame>,
}

impl Renderer<'_> {
    fn push(&mut self, s: &str) {
        if self.double_percents && s.contains('%') {
            self.out.push_str(&s.replace('%', "%%"));
        } else {
            self.out.push_str(s);
        }
    }

    fn quote(&self, ident: &str) -> String {
        self.dialect.quote_identifier(ident)
    }

    fn push_ident(&mut self, ident: &str) {
        let quoted = self.quote(ident);
        self.push(&quoted);
    }

    fn list<F>(&mut self, nodes: &[NodeRef], sep: &str, mut each: F) -> ClauseResult<()>
    where
        F: FnMut(&mut Self, &NodeRef) -> ClauseResult<()>,
    {
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                self.push(sep);
            }
            each(self, node)?;
        }
        Ok(())
    }

    /// Render with no enclosing statements in scope.
    fn isolated(&mut self, node: &NodeRef) -> ClauseResult<()> {
        let saved = std::mem::take(&mut self.frames);
        let result = self.statement(node);
        self.frames = saved;
        result
    }

    // ==================== Statements ====================

    fn statement(&mut self, node: &NodeRef) -> ClauseResult<()> {
        match node.kind() {
            NodeKind::Select(select) => self.select(select),
            NodeKind::Compound { op, selects } => self.compound(*op, selects),
            NodeKind::TextualSelect { text, .. } => self.expr(text, 0),
            NodeKind::Insert(insert) => self.insert(insert),
            NodeKind::Update(update) => self.update(update),
            NodeKind::Delete(delete) => self.delete(delete),
            _ if node.is_from_clause() => self.from_item(node),
            _ => self.expr(node, 0),
        }
    }

    fn select(&mut self, select: &Select) -> ClauseResult<()> {
        if select.columns.is_empty() {
            return Err(ClauseError::compile(
                "SELECT construct has no columns to render",
            ));
        }
        let froms = self.display_froms(select)?;

        let mut frame = Frame {
            columns: select.columns.clone(),
            ..Frame::default()
        };
        for from in &froms {
            frame.provide(from);
        }
        self.frames.push(frame);
        let result = self.select_body(select, &froms);
        self.frames.pop();
        result
    }

    fn select_body(&mut self, select: &Select, froms: &[NodeRef]) -> ClauseResult<()> {
        self.push("SELECT ");
        if select.distinct {
            self.push("DISTINCT ");
        }
        self.list(&select.columns, ", ", |r, c| r.column_item(c))?;

        if !froms.is_empty() {
            self.push(" FROM ");
            self.list(froms, ", ", |r, f| r.from_item(f))?;
        }
        if let Some(where_) = &select.where_ {
            self.push(" WHERE ");
            self.expr(where_, 0)?;
        }
        if !select.group_by.is_empty() {
            self.push(" GROUP BY ");
            self.list(&select.group_by, ", ", |r, g| r.expr(g, 0))?;
        }
        if let Some(having) = &select.having {
            self.push(" HAVING ");
            self.expr(having, 0)?;
        }
        if !select.order_by.is_empty() {
            self.push(" ORDER BY ");
            self.list(&select.order_by, ", ", |r, o| r.expr(o, 0))?;
        }
        self.paging(select)
    }

    /// FROM list of a SELECT: elements referenced by the columns clause,
    /// then WHERE, then the explicit FROM list, minus members of listed
    /// joins and minus whatever an enclosing statement already provides.
    fn display_froms(&self, select: &Select) -> ClauseResult<Vec<NodeRef>> {
        let mut found = Vec::new();
        for column in &select.columns {
            collect_froms(column, &mut found);
        }
        if let Some(where_) = &select.where_ {
            collect_froms(where_, &mut found);
        }
        found.extend(select.froms.iter().cloned());

        let mut hidden = HashSet::new();
        for from in &found {
            if let NodeKind::Join(join) = from.kind() {
                join_members(&join.left, &mut hidden);
                join_members(&join.right, &mut hidden);
            }
        }
        let mut seen = HashSet::new();
        let froms: Vec<NodeRef> = found
            .into_iter()
            .filter(|f| !hidden.contains(&Arc::as_ptr(f)) && seen.insert(Arc::as_ptr(f)))
            .collect();

        if !select.auto_correlate || self.frames.is_empty() || froms.is_empty() {
            return Ok(froms);
        }
        let remaining: Vec<NodeRef> = froms
            .into_iter()
            .filter(|f| {
                !self
                    .frames
                    .iter()
                    .any(|frame| frame.provides.contains(&Arc::as_ptr(f)))
            })
            .collect();
        if remaining.is_empty() {
            return Err(ClauseError::compile(
                "SELECT returned no FROM clauses due to auto-correlation; \
                 use correlate(false) to keep its FROM list",
            ));
        }
        Ok(remaining)
    }

    fn paging(&mut self, select: &Select) -> ClauseResult<()> {
        match self.dialect.paging() {
            Paging::LimitOffset { offset_only_limit } => {
                if let Some(limit) = &select.limit {
                    self.push(" LIMIT ");
                    self.expr(limit, 0)?;
                } else if let (Some(_), Some(filler)) = (&select.offset, offset_only_limit) {
                    self.push(" LIMIT ");
                    self.push(filler);
                }
                if let Some(offset) = &select.offset {
                    self.push(" OFFSET ");
                    self.expr(offset, 0)?;
                }
            }
            Paging::OffsetFetch => {
                if let Some(offset) = &select.offset {
                    self.push(" OFFSET ");
                    self.expr(offset, 0)?;
                    self.push(" ROWS");
                }
                if let Some(limit) = &select.limit {
                    self.push(" FETCH FIRST ");
                    self.expr(limit, 0)?;
                    self.push(" ROWS ONLY");
                }
            }
        }
        Ok(())
    }

    fn compound(&mut self, op: SetOp, selects: &[NodeRef]) -> ClauseResult<()> {
        for (i, select) in selects.iter().enumerate() {
            if i > 0 {
                self.push(" ");
                self.push(op.as_sql());
                self.push(" ");
            }
            let wrap = match select.kind() {
                NodeKind::Select(s) => {
                    s.limit.is_some() || s.offset.is_some() || !s.order_by.is_empty()
                }
                NodeKind::Compound { .. } => true,
                _ => false,
            };
            if wrap {
                self.push("(");
            }
            self.statement(select)?;
            if wrap {
                self.push(")");
            }
        }
        Ok(())
    }

    // ==================== DML ====================

    fn check_returning(&self, returning: &[NodeRef]) -> ClauseResult<()> {
        if !returning.is_empty() && !self.dialect.supports_returning() {
            return Err(ClauseError::compile(format!(
                "RETURNING is not supported by the {} dialect",
                self.dialect.name()
            )));
        }
        Ok(())
    }

    fn returning(&mut self, returning: &[NodeRef]) -> ClauseResult<()> {
        if returning.is_empty() {
            return Ok(());
        }
        self.push(" RETURNING ");
        self.list(returning, ", ", |r, c| r.column_item(c))
    }

    fn dml_frame(&mut self, table: &NodeRef) {
        let mut frame = Frame::default();
        frame.provide(table);
        self.frames.push(frame);
    }

    fn insert(&mut self, insert: &Insert) -> ClauseResult<()> {
        self.check_returning(&insert.returning)?;
        self.push("INSERT INTO ");
        self.from_item(&insert.table)?;

        self.dml_frame(&insert.table);
        let result = self.insert_body(insert);
        self.frames.pop();
        result
    }

    fn insert_body(&mut self, insert: &Insert) -> ClauseResult<()> {
        if let Some((columns, select)) = &insert.select {
            self.push(" (");
            self.idents(columns);
            self.push(") ");
            self.isolated(select)?;
        } else if insert.values.is_empty() {
            self.push(" ");
            self.push(self.dialect.default_values());
        } else {
            self.push(" (");
            let keys: Vec<&str> = insert.values.iter().map(|(k, _)| k.as_str()).collect();
            self.idents(&keys);
            self.push(") VALUES (");
            for (i, (_, value)) in insert.values.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                self.expr(value, 0)?;
            }
            self.push(")");
        }
        self.returning(&insert.returning)
    }

    fn idents<S: AsRef<str>>(&mut self, names: &[S]) {
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_ident(name.as_ref());
        }
    }

    fn update(&mut self, update: &Update) -> ClauseResult<()> {
        if update.values.is_empty() {
            return Err(ClauseError::compile(
                "UPDATE construct has no SET clause; call set() before compiling",
            ));
        }
        self.check_returning(&update.returning)?;
        self.push("UPDATE ");
        self.from_item(&update.table)?;

        self.dml_frame(&update.table);
        let result = self.update_body(update);
        self.frames.pop();
        result
    }

    fn update_body(&mut self, update: &Update) -> ClauseResult<()> {
        self.push(" SET ");
        for (i, (key, value)) in update.values.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_ident(key);
            self.push(" = ");
            self.expr(value, 0)?;
        }
        if let Some(where_) = &update.where_ {
            self.push(" WHERE ");
            self.expr(where_, 0)?;
        }
        self.returning(&update.returning)
    }

    fn delete(&mut self, delete: &Delete) -> ClauseResult<()> {
        self.check_returning(&delete.returning)?;
        self.push("DELETE FROM ");
        self.from_item(&delete.table)?;

        self.dml_frame(&delete.table);
        let result = self.delete_body(delete);
        self.frames.pop();
        result
    }

    fn delete_body(&mut self, delete: &Delete) -> ClauseResult<()> {
        if let Some(where_) = &delete.where_ {
            self.push(" WHERE ");
            self.expr(where_, 0)?;
        }
        self.returning(&delete.returning)
    }

    // ==================== FROM elements ====================

    /// Name a FROM element is referenced by from column expressions.
    fn from_ref(&mut self, from: &NodeRef) -> Option<String> {
        match from.kind() {
            NodeKind::Table(table) => Some(match &table.schema {
                Some(schema) => format!("{}.{}", self.quote(schema), self.quote(&table.name)),
                None => self.quote(&table.name),
            }),
            NodeKind::Alias { name, .. } | NodeKind::Subquery { name, .. } => Some(match name {
                Some(name) => self.quote(name),
                None => self.namer.anon(from),
            }),
            _ => None,
        }
    }

    fn from_item(&mut self, from: &NodeRef) -> ClauseResult<()> {
        match from.kind() {
            NodeKind::Table(_) => {
                if let Some(name) = self.from_ref(from) {
                    self.push(&name);
                }
            }
            NodeKind::Alias { element, .. } | NodeKind::Subquery { element, .. } => {
                if matches!(element.kind(), NodeKind::Table(_)) {
                    self.from_item(element)?;
                } else {
                    self.push("(");
                    self.isolated(element)?;
                    self.push(")");
                }
                self.push(" AS ");
                if let Some(name) = self.from_ref(from) {
                    self.push(&name);
                }
            }
            NodeKind::Join(join) => {
                self.from_item(&join.left)?;
                self.push(" ");
                self.push(join.kind.as_sql());
                self.push(" ");
                let nested = matches!(join.right.kind(), NodeKind::Join(_));
                if nested {
                    self.push("(");
                }
                self.from_item(&join.right)?;
                if nested {
                    self.push(")");
                }
                self.push(" ON ");
                self.expr(&join.on, 0)?;
            }
            NodeKind::Text(sql) => self.push(sql),
            _ if from.is_select_statement() => {
                self.push("(");
                self.isolated(from)?;
                self.push(")");
            }
            _ => {
                return Err(ClauseError::compile(format!(
                    "{} cannot be rendered as a FROM element",
                    from.repr()
                )));
            }
        }
        Ok(())
    }

    // ==================== Columns clause ====================

    fn label_name(&mut self, label: &NodeRef) -> String {
        match label.kind() {
            NodeKind::Label {
                name: Some(name), ..
            } => self.quote(name),
            _ => self.namer.anon(label),
        }
    }

    fn column_item(&mut self, node: &NodeRef) -> ClauseResult<()> {
        match node.kind() {
            NodeKind::Label { element, .. } => {
                self.expr(element, 0)?;
                self.push(" AS ");
                let name = self.label_name(node);
                self.push(&name);
            }
            _ if node.is_from_clause() => {
                let columns = node.columns();
                if columns.is_empty() {
                    match self.from_ref(node) {
                        Some(name) => {
                            self.push(&name);
                            self.push(".*");
                        }
                        None => self.push("*"),
                    }
                } else {
                    self.list(&columns, ", ", |r, c| r.expr(c, 0))?;
                }
            }
            _ => self.expr(node, 0)?,
        }
        Ok(())
    }

    fn label_in_scope(&self, label: &NodeRef) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.columns.iter().any(|c| Arc::ptr_eq(c, label)))
    }

    fn label_reference(&mut self, target: &NodeRef) -> ClauseResult<()> {
        match target.kind() {
            NodeKind::Label { element, .. } => {
                if self.label_in_scope(target) {
                    let name = self.label_name(target);
                    self.push(&name);
                    Ok(())
                } else {
                    self.expr(element, 0)
                }
            }
            NodeKind::Ordering {
                element,
                descending,
                nulls,
            } => {
                self.label_reference(element)?;
                self.ordering_suffix(*descending, *nulls);
                Ok(())
            }
            _ => self.expr(target, 0),
        }
    }

    /// A bare name in ORDER BY / GROUP BY: a label or column of the
    /// enclosing columns clause.
    fn textual_label(&mut self, name: &str) -> ClauseResult<()> {
        let found = self.frames.last().and_then(|frame| {
            frame.columns.iter().find_map(|c| match c.kind() {
                NodeKind::Label {
                    name: Some(label), ..
                } if label == name => Some((Arc::clone(c), true)),
                NodeKind::Column(col) if col.name == name => Some((Arc::clone(c), false)),
                _ => None,
            })
        });
        match found {
            Some((_, true)) => {
                self.push_ident(name);
                Ok(())
            }
            Some((column, false)) => self.expr(&column, 0),
            None => Err(ClauseError::compile(format!(
                "Can't resolve label reference '{name}'; declare it with text('{name}') \
                 to render it as literal SQL"
            ))),
        }
    }

    fn ordering_suffix(&mut self, descending: bool, nulls: Option<NullsOrder>) {
        if descending {
            self.push(" DESC");
        }
        match nulls {
            Some(NullsOrder::First) => self.push(" NULLS FIRST"),
            Some(NullsOrder::Last) => self.push(" NULLS LAST"),
            None => {}
        }
    }

    // ==================== Expressions ====================

    /// Render a column expression inside an operator binding with
    /// strength `outer`.
    fn expr(&mut self, node: &NodeRef, outer: u8) -> ClauseResult<()> {
        match node.kind() {
            NodeKind::Null => self.push("NULL"),
            NodeKind::True => {
                let s = self.dialect.render_bool(true);
                self.push(s);
            }
            NodeKind::False => {
                let s = self.dialect.render_bool(false);
                self.push(s);
            }
            NodeKind::BindParam(bind) => return self.bind(node, bind),
            NodeKind::Column(column) => return self.column(column),
            NodeKind::Text(sql) => self.push(sql),
            NodeKind::TextualSelect { text, .. } => {
                self.push("(");
                self.expr(text, 0)?;
                self.push(")");
            }
            NodeKind::Unary { op, operand } => return self.unary(*op, operand, outer),
            NodeKind::Binary { left, op, right } => return self.binary(left, *op, right, outer),
            NodeKind::ClauseList { op, clauses } => return self.clause_list(*op, clauses, outer),
            NodeKind::Grouping(inner) => {
                self.push("(");
                self.expr(inner, 0)?;
                self.push(")");
            }
            NodeKind::Function { name, args } => {
                self.push(name);
                self.push("(");
                self.list(args, ", ", |r, a| r.expr(a, 0))?;
                self.push(")");
            }
            NodeKind::Cast { element, to } => {
                let Some(type_name) = self.dialect.type_name(*to) else {
                    return Err(ClauseError::compile(format!(
                        "the {} dialect cannot CAST to {}",
                        self.dialect.name(),
                        to.name()
                    )));
                };
                self.push("CAST(");
                self.expr(element, 0)?;
                self.push(" AS ");
                self.push(type_name);
                self.push(")");
            }
            NodeKind::Label { element, .. } => return self.expr(element, outer),
            NodeKind::LabelReference(target) => return self.label_reference(target),
            NodeKind::TextualLabelReference(name) => return self.textual_label(name),
            NodeKind::Ordering {
                element,
                descending,
                nulls,
            } => {
                self.expr(element, 0)?;
                self.ordering_suffix(*descending, *nulls);
            }
            NodeKind::ScalarSubquery(inner) => {
                self.push("(");
                self.statement(inner)?;
                self.push(")");
            }
            NodeKind::TableValued(from) => match self.from_ref(from) {
                Some(name) => self.push(&name),
                None => {
                    return Err(ClauseError::compile(format!(
                        "{} has no name to reference as a row value",
                        from.repr()
                    )));
                }
            },
            NodeKind::Select(_) | NodeKind::Compound { .. } => {
                self.push("(");
                self.statement(node)?;
                self.push(")");
            }
            NodeKind::Table(_)
            | NodeKind::Alias { .. }
            | NodeKind::Subquery { .. }
            | NodeKind::Join(_) => {
                return Err(ClauseError::compile(format!(
                    "{} cannot be rendered as a column expression",
                    node.repr()
                )));
            }
            NodeKind::Insert(_) | NodeKind::Update(_) | NodeKind::Delete(_) => {
                return Err(ClauseError::compile(format!(
                    "{} cannot be embedded in another statement",
                    node.kind_name()
                )));
            }
            NodeKind::Deferred { .. } => {
                return Err(ClauseError::compile(
                    "deferred expression was not resolved before rendering",
                ));
            }
        }
        Ok(())
    }

    fn bind(&mut self, node: &NodeRef, bind: &BindParam) -> ClauseResult<()> {
        if self.literal_binds {
            return self.literal_bind(bind);
        }
        let slot = self.analysis.slot(node).ok_or_else(|| {
            ClauseError::compile(format!(
                "{} is not part of the statement being compiled",
                node.repr()
            ))
        })?;
        let name = self.namer.bind(node, bind);
        self.out.push_bind(slot, name, bind.expanding);
        Ok(())
    }

    fn literal_bind(&mut self, bind: &BindParam) -> ClauseResult<()> {
        if !bind.expanding {
            let literal = self.dialect.render_literal(&bind.value)?;
            self.push(&literal);
            return Ok(());
        }
        let items = bind.value.expand();
        if items.is_empty() {
            let empty = self.dialect.empty_set_expr();
            self.push(empty);
            return Ok(());
        }
        let rendered = items
            .iter()
            .map(|v| self.dialect.render_literal(v))
            .collect::<ClauseResult<Vec<_>>>()?;
        self.push("(");
        self.push(&rendered.join(", "));
        self.push(")");
        Ok(())
    }

    fn column(&mut self, column: &Column) -> ClauseResult<()> {
        if column.is_literal {
            self.push(&column.name);
            return Ok(());
        }
        if let Some(table) = &column.table {
            if let Some(qualifier) = self.from_ref(table) {
                self.push(&qualifier);
                self.push(".");
            }
        }
        self.push_ident(&column.name);
        Ok(())
    }

    fn unary(&mut self, op: UnaryOp, operand: &NodeRef, outer: u8) -> ClauseResult<()> {
        let prec = op.precedence();
        let wrap = prec < outer;
        if wrap {
            self.push("(");
        }
        self.push(op.as_sql());
        match op {
            // `- -x` must not become a `--` comment
            UnaryOp::Neg | UnaryOp::BitNot => self.expr(operand, prec + 1)?,
            _ => {
                self.push(" ");
                self.expr(operand, prec)?;
            }
        }
        if wrap {
            self.push(")");
        }
        Ok(())
    }

    fn binary(
        &mut self,
        left: &NodeRef,
        op: BinaryOp,
        right: &NodeRef,
        outer: u8,
    ) -> ClauseResult<()> {
        let Some(spelling) = self.dialect.binary_operator(op) else {
            return Err(ClauseError::compile(format!(
                "operator {} is not supported by the {} dialect",
                op.as_sql(),
                self.dialect.name()
            )));
        };
        match spelling {
            Operator::Function(name) => {
                self.push(name);
                self.push("(");
                self.expr(left, 0)?;
                self.push(", ");
                self.expr(right, 0)?;
                self.push(")");
            }
            Operator::NegatedInfix(symbol) => {
                let wrap = UnaryOp::Not.precedence() < outer;
                if wrap {
                    self.push("(");
                }
                self.push("NOT (");
                self.infix(left, op, symbol, right)?;
                self.push(")");
                if wrap {
                    self.push(")");
                }
            }
            Operator::Infix(symbol) => {
                let wrap = op.precedence() < outer;
                if wrap {
                    self.push("(");
                }
                self.infix(left, op, symbol, right)?;
                if wrap {
                    self.push(")");
                }
            }
        }
        Ok(())
    }

    fn infix(&mut self, left: &NodeRef, op: BinaryOp, symbol: &str, right: &NodeRef) -> ClauseResult<()> {
        let prec = op.precedence();
        self.expr(left, prec)?;
        self.push(" ");
        self.push(symbol);
        self.push(" ");

        if let (BinaryOp::Between | BinaryOp::NotBetween, NodeKind::ClauseList { clauses, .. }) =
            (op, right.kind())
        {
            if let [low, high] = clauses.as_slice() {
                self.expr(low, prec + 1)?;
                self.push(" AND ");
                return self.expr(high, prec + 1);
            }
        }

        let right_outer = if op.is_associative() { prec } else { prec + 1 };
        self.expr(right, right_outer)
    }

    fn clause_list(&mut self, op: ListOp, clauses: &[NodeRef], outer: u8) -> ClauseResult<()> {
        match clauses {
            [] => {
                let empty = match op {
                    ListOp::And => self.dialect.render_bool(true),
                    ListOp::Or => self.dialect.render_bool(false),
                    ListOp::Comma => "",
                };
                self.push(empty);
                Ok(())
            }
            [single] => self.expr(single, outer),
            _ => {
                let prec = op.precedence();
                let wrap = prec < outer;
                if wrap {
                    self.push("(");
                }
                self.list(clauses, op.separator(), |r, c| r.expr(c, prec))?;
                if wrap {
                    self.push(")");
                }
                Ok(())
            }
        }
    }
}

/// FROM elements a column expression refers to, not descending into
/// nested statements.
fn collect_froms(node: &NodeRef, out: &mut Vec<NodeRef>) {
    match node.kind() {
        NodeKind::Column(column) => {
            if let Some(table) = &column.table {
                out.push(Arc::clone(table));
            }
        }
        NodeKind::TableValued(from) => out.push(Arc::clone(from)),
        _ if node.is_from_clause() => out.push(Arc::clone(node)),
        NodeKind::ScalarSubquery(_)
        | NodeKind::Select(_)
        | NodeKind::Compound { .. }
        | NodeKind::TextualSelect { .. }
        | NodeKind::LabelReference(_) => {}
        _ => {
            for child in node.children() {
                collect_froms(child, out);
            }
        }
    }
}

fn join_members(from: &NodeRef, hidden: &mut HashSet<*const Node>) {
    hidden.insert(Arc::as_ptr(from));
    if let NodeKind::Join(join) = from.kind() {
        join_members(&join.left, hidden);
        join_members(&join.right, hidden);
    }
}
