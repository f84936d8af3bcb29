//! The store connection seam.
//!
//! The writer only needs two capabilities from a store: an accumulator of
//! plain SQL statements, and a prepared statement that collects bound rows.
//! Both are executed as one batch and released explicitly.

pub mod sqlite;

use writebatch_core::errors::StoreError;

use crate::value::SqlValue;

pub trait StoreConnection {
    /// Open an empty accumulator for non-parameterized statements.
    fn create_statement_batch(&self) -> Result<Box<dyn StatementBatch + '_>, StoreError>;

    /// Prepare a parameterized statement whose rows are collected with
    /// [`PreparedBatch::bind`] and [`PreparedBatch::add_batch`].
    fn prepare_batch(&self, sql: &str) -> Result<Box<dyn PreparedBatch + '_>, StoreError>;
}

pub trait StatementBatch {
    fn add(&mut self, sql: String) -> Result<(), StoreError>;

    fn statements(&self) -> &[String];

    fn len(&self) -> usize {
        self.statements().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every queued statement in order and return the affected-row
    /// count of each. A failure part way leaves earlier statements applied.
    fn execute(&mut self) -> Result<Vec<usize>, StoreError>;

    fn close(self: Box<Self>) -> Result<(), StoreError>;
}

pub trait PreparedBatch {
    fn sql(&self) -> &str;

    fn parameter_count(&self) -> usize;

    /// Bind `value` to the 1-based parameter `index` of the current row.
    fn bind(&mut self, index: usize, value: &SqlValue) -> Result<(), StoreError>;

    /// Queue the current row; every parameter must be bound.
    fn add_batch(&mut self) -> Result<(), StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn execute(&mut self) -> Result<Vec<usize>, StoreError>;

    fn close(self: Box<Self>) -> Result<(), StoreError>;
}
