//! INSERT / UPDATE / DELETE construction.

use super::selectable::conjoin;
use super::{Delete, Insert, Node, NodeKind, NodeRef, Update};
use crate::coercion::{CoercionArgs, Input, coerce_key, coerce_node};
use crate::diagnostics::Diagnostic;
use crate::error::{ClauseError, ClauseResult};
use crate::role::Role;

/// Start an INSERT into `table`.
pub fn insert(table: impl Into<Input>) -> ClauseResult<InsertBuilder> {
    let (table, diagnostics) = dml_table(table.into())?;
    Ok(InsertBuilder {
        insert: Insert {
            table,
            values: Vec::new(),
            select: None,
            returning: Vec::new(),
        },
        diagnostics,
    })
}

/// Start an UPDATE of `table`.
pub fn update(table: impl Into<Input>) -> ClauseResult<UpdateBuilder> {
    let (table, diagnostics) = dml_table(table.into())?;
    Ok(UpdateBuilder {
        update: Update {
            table,
            values: Vec::new(),
            where_: None,
            returning: Vec::new(),
        },
        diagnostics,
    })
}

/// Start a DELETE from `table`.
pub fn delete(table: impl Into<Input>) -> ClauseResult<DeleteBuilder> {
    let (table, diagnostics) = dml_table(table.into())?;
    Ok(DeleteBuilder {
        delete: Delete {
            table,
            where_: None,
            returning: Vec::new(),
        },
        diagnostics,
    })
}

fn dml_table(input: Input) -> ClauseResult<(NodeRef, Vec<Diagnostic>)> {
    coerce_node(
        Role::DmlTable,
        input,
        &CoercionArgs::new().argname("table"),
    )
}

/// Coerce one SET/VALUES pair: the column to its key, the value to an
/// expression typed like the target column.
fn crud_pair(
    table: &NodeRef,
    column: Input,
    value: Input,
    diagnostics: &mut Vec<Diagnostic>,
) -> ClauseResult<(String, NodeRef)> {
    let (key, diags) = coerce_key(
        Role::DmlColumn,
        column,
        &CoercionArgs::new().as_key(true).argname("column"),
    )?;
    diagnostics.extend(diags);

    let type_ = table.column_type(&key).ok_or_else(|| {
        ClauseError::construction(format!("{} has no column '{key}'", table.repr()))
    })?;
    let mut args = CoercionArgs::new().name(key.clone()).is_crud(true);
    if !type_.is_null() {
        args = args.type_(type_);
    }
    let (node, diags) = coerce_node(Role::ExpressionElement, value, &args)?;
    diagnostics.extend(diags);
    Ok((key, node))
}

fn set_value(values: &mut Vec<(String, NodeRef)>, key: String, node: NodeRef) {
    match values.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = node,
        None => values.push((key, node)),
    }
}

fn returning_columns<I, T>(
    returning: &mut Vec<NodeRef>,
    diagnostics: &mut Vec<Diagnostic>,
    columns: I,
) -> ClauseResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<Input>,
{
    let args = CoercionArgs::new().argname("returning");
    for column in columns {
        let (node, diags) = coerce_node(Role::ColumnsClause, column.into(), &args)?;
        diagnostics.extend(diags);
        returning.push(node);
    }
    Ok(())
}

fn conjoin_where(
    where_: &mut Option<NodeRef>,
    diagnostics: &mut Vec<Diagnostic>,
    clause: Input,
) -> ClauseResult<()> {
    let (node, diags) = coerce_node(
        Role::WhereHaving,
        clause,
        &CoercionArgs::new().argname("whereclause"),
    )?;
    diagnostics.extend(diags);
    *where_ = Some(conjoin(where_.take(), node));
    Ok(())
}

#[derive(Debug, Clone)]
pub struct InsertBuilder {
    insert: Insert,
    diagnostics: Vec<Diagnostic>,
}

impl InsertBuilder {
    /// Set the value of one column; setting a column twice keeps the last value.
    pub fn value(mut self, column: impl Into<Input>, value: impl Into<Input>) -> ClauseResult<Self> {
        let (key, node) = crud_pair(
            &self.insert.table,
            column.into(),
            value.into(),
            &mut self.diagnostics,
        )?;
        set_value(&mut self.insert.values, key, node);
        Ok(self)
    }

    pub fn values<I, K, V>(mut self, pairs: I) -> ClauseResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Input>,
        V: Into<Input>,
    {
        for (column, value) in pairs {
            self = self.value(column, value)?;
        }
        Ok(self)
    }

    /// `INSERT INTO table (columns) SELECT ...`
    pub fn from_select<I, T>(mut self, columns: I, select: impl Into<Input>) -> ClauseResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Input>,
    {
        let mut keys = Vec::new();
        for column in columns {
            let (key, diags) = coerce_key(
                Role::DmlColumn,
                column.into(),
                &CoercionArgs::new().as_key(true).argname("names"),
            )?;
            self.diagnostics.extend(diags);
            keys.push(key);
        }
        let (select, diags) = coerce_node(
            Role::DmlSelect,
            select.into(),
            &CoercionArgs::new().argname("select"),
        )?;
        self.diagnostics.extend(diags);
        self.insert.select = Some((keys, select));
        Ok(self)
    }

    pub fn returning<I, T>(mut self, columns: I) -> ClauseResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Input>,
    {
        returning_columns(&mut self.insert.returning, &mut self.diagnostics, columns)?;
        Ok(self)
    }

    pub fn build(self) -> ClauseResult<NodeRef> {
        if self.insert.select.is_some() && !self.insert.values.is_empty() {
            return Err(ClauseError::construction(
                "INSERT cannot combine values() with from_select()",
            ));
        }
        Ok(Node::new(NodeKind::Insert(Box::new(self.insert)))
            .with_diagnostics(self.diagnostics)
            .into_ref())
    }
}

#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    update: Update,
    diagnostics: Vec<Diagnostic>,
}

impl UpdateBuilder {
    pub fn set(mut self, column: impl Into<Input>, value: impl Into<Input>) -> ClauseResult<Self> {
        let (key, node) = crud_pair(
            &self.update.table,
            column.into(),
            value.into(),
            &mut self.diagnostics,
        )?;
        set_value(&mut self.update.values, key, node);
        Ok(self)
    }

    /// Add a WHERE criterion; repeated calls are AND-ed.
    pub fn filter(mut self, clause: impl Into<Input>) -> ClauseResult<Self> {
        conjoin_where(&mut self.update.where_, &mut self.diagnostics, clause.into())?;
        Ok(self)
    }

    pub fn returning<I, T>(mut self, columns: I) -> ClauseResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Input>,
    {
        returning_columns(&mut self.update.returning, &mut self.diagnostics, columns)?;
        Ok(self)
    }

    pub fn build(self) -> NodeRef {
        Node::new(NodeKind::Update(Box::new(self.update)))
            .with_diagnostics(self.diagnostics)
            .into_ref()
    }
}

#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    delete: Delete,
    diagnostics: Vec<Diagnostic>,
}

impl DeleteBuilder {
    /// Add a WHERE criterion; repeated calls are AND-ed.
    pub fn filter(mut self, clause: impl Into<Input>) -> ClauseResult<Self> {
        conjoin_where(&mut self.delete.where_, &mut self.diagnostics, clause.into())?;
        Ok(self)
    }

    pub fn returning<I, T>(mut self, columns: I) -> ClauseResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Input>,
    {
        returning_columns(&mut self.delete.returning, &mut self.diagnostics, columns)?;
        Ok(self)
    }

    pub fn build(self) -> NodeRef {
        Node::new(NodeKind::Delete(Box::new(self.delete)))
            .with_diagnostics(self.diagnostics)
            .into_ref()
    }
}
