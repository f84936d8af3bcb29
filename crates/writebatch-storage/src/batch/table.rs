//! Per-table pending deletes and inserts for one write cycle.

use std::collections::{BTreeMap, BTreeSet};

use writebatch_core::errors::WriteError;

use crate::value::SqlValue;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableBatch {
    table_name: String,
    column_names: Vec<String>,
    ids_to_delete: BTreeSet<i64>,
    rows_to_insert: BTreeMap<i64, Vec<SqlValue>>,
}

impl TableBatch {
    pub fn new<I, S>(table_name: impl Into<String>, column_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table_name: table_name.into(),
            column_names: column_names.into_iter().map(Into::into).collect(),
            ids_to_delete: BTreeSet::new(),
            rows_to_insert: BTreeMap::new(),
        }
    }

    /// A batch that only ever deletes.
    pub fn deletes_only(table_name: impl Into<String>) -> Self {
        Self::new(table_name, Vec::<String>::new())
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Replace the column list. Rows already queued are checked again by
    /// the writer before anything is sent to the store.
    pub fn set_column_names<I, S>(&mut self, column_names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_names = column_names.into_iter().map(Into::into).collect();
    }

    /// Returns `false` if the id was already pending deletion.
    pub fn add_delete(&mut self, id: i64) -> bool {
        self.ids_to_delete.insert(id)
    }

    /// Queue a row; a second insert for the same id replaces the first.
    pub fn add_insert(&mut self, id: i64, values: Vec<SqlValue>) -> Result<(), WriteError> {
        self.check_row(id, &values)?;
        self.rows_to_insert.insert(id, values);
        Ok(())
    }

    pub fn ids_to_delete(&self) -> &BTreeSet<i64> {
        &self.ids_to_delete
    }

    pub fn rows_to_insert(&self) -> &BTreeMap<i64, Vec<SqlValue>> {
        &self.rows_to_insert
    }

    pub fn pending_deletes(&self) -> usize {
        self.ids_to_delete.len()
    }

    pub fn pending_inserts(&self) -> usize {
        self.rows_to_insert.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids_to_delete.is_empty() && self.rows_to_insert.is_empty()
    }

    /// Whether the insert phase has anything to do for this table.
    pub fn has_inserts(&self) -> bool {
        !self.column_names.is_empty() && !self.rows_to_insert.is_empty()
    }

    pub fn clear_inserts(&mut self) {
        self.rows_to_insert.clear();
    }

    pub fn clear_deletes(&mut self) {
        self.ids_to_delete.clear();
    }

    /// Check every queued row against the current column list.
    pub fn validate(&self) -> Result<(), WriteError> {
        self.rows_to_insert
            .iter()
            .try_for_each(|(id, values)| self.check_row(*id, values))
    }

    fn check_row(&self, id: i64, values: &[SqlValue]) -> Result<(), WriteError> {
        if values.len() != self.column_names.len() {
            return Err(WriteError::ShapeMismatch {
                table: self.table_name.clone(),
                row_id: id,
                expected: self.column_names.len(),
                actual: values.len(),
            });
        }
        Ok(())
    }
}
