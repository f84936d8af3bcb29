//! FlushJob: one sealed batch, owned by the caller until executed.

use std::fmt;

use writebatch_core::errors::{StoreError, WriteError};
use writebatch_core::types::{FlushKind, WritePhase};

use crate::store::{PreparedBatch, StatementBatch};

enum SealedBatch<'c> {
    Statements(Box<dyn StatementBatch + 'c>),
    Prepared(Box<dyn PreparedBatch + 'c>),
}

/// A ready-to-run batch produced by [`super::BatchWriter::write`].
///
/// The job borrows the connection it was built on. Running it twice is not
/// idempotent: a successful run drains the batch, a failed one may have
/// applied a prefix of it.
pub struct FlushJob<'c> {
    kind: FlushKind,
    tables: Vec<String>,
    entries: usize,
    batch: SealedBatch<'c>,
}

impl<'c> FlushJob<'c> {
    pub fn from_statements(
        kind: FlushKind,
        tables: Vec<String>,
        batch: Box<dyn StatementBatch + 'c>,
    ) -> Self {
        Self {
            kind,
            tables,
            entries: batch.len(),
            batch: SealedBatch::Statements(batch),
        }
    }

    pub fn from_prepared(table: &str, batch: Box<dyn PreparedBatch + 'c>) -> Self {
        Self {
            kind: FlushKind::Insert,
            tables: vec![table.to_string()],
            entries: batch.len(),
            batch: SealedBatch::Prepared(batch),
        }
    }

    pub fn kind(&self) -> FlushKind {
        self.kind
    }

    /// Tables touched by this job, in the order their entries were queued.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn touches(&self, table: &str) -> bool {
        self.tables.iter().any(|t| t == table)
    }

    /// Statements or bound rows in the batch when it was sealed.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// SQL of a statement batch, or the single prepared statement.
    pub fn sql(&self) -> Vec<&str> {
        match &self.batch {
            SealedBatch::Statements(batch) => {
                batch.statements().iter().map(String::as_str).collect()
            }
            SealedBatch::Prepared(batch) => vec![batch.sql()],
        }
    }

    pub fn is_prepared(&self) -> bool {
        matches!(self.batch, SealedBatch::Prepared(_))
    }

    /// Run the batch; returns the affected-row count of each entry.
    pub fn execute(&mut self) -> Result<Vec<usize>, WriteError> {
        let result = match &mut self.batch {
            SealedBatch::Statements(batch) => batch.execute(),
            SealedBatch::Prepared(batch) => batch.execute(),
        };
        result.map_err(|e| WriteError::failure(self.tables.join(","), WritePhase::Execute, e))
    }

    /// Release the underlying statement.
    pub fn close(self) -> Result<(), WriteError> {
        self.release().map_err(|e| WriteError::release(e, None))
    }

    pub(crate) fn release(self) -> Result<(), StoreError> {
        match self.batch {
            SealedBatch::Statements(batch) => batch.close(),
            SealedBatch::Prepared(batch) => batch.close(),
        }
    }
}

impl fmt::Debug for FlushJob<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlushJob")
            .field("kind", &self.kind)
            .field("tables", &self.tables)
            .field("entries", &self.entries)
            .field("prepared", &self.is_prepared())
            .finish()
    }
}
