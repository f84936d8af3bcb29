//! Insert strategies: how a table's pending rows become batch entries.

use writebatch_core::errors::{StoreError, WriteError};
use writebatch_core::types::{FlushKind, InsertMode, WritePhase};

use super::flush::FlushJob;
use super::queue::FlushQueue;
use super::sql;
use super::table::TableBatch;
use crate::store::PreparedBatch;

/// Turns the pending rows of one table into queued batch entries.
///
/// Called once per table that has both columns and rows, after the delete
/// phase is sealed. Implementations must release anything they opened
/// before returning an error.
pub trait InsertStrategy: Send + Sync {
    fn mode(&self) -> InsertMode;

    fn queue_inserts<'c>(
        &self,
        queue: &mut FlushQueue<'c, '_>,
        table: &str,
        batch: &TableBatch,
    ) -> Result<(), WriteError>;
}

pub fn strategy_for(mode: InsertMode) -> Box<dyn InsertStrategy> {
    match mode {
        InsertMode::Literal => Box::new(LiteralInserts),
        InsertMode::Parameterized => Box::new(ParameterizedInserts),
    }
}

/// Renders every row as its own `INSERT` statement in the shared
/// accumulator, sealed every `max_batch_size` statements like deletes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralInserts;

impl InsertStrategy for LiteralInserts {
    fn mode(&self) -> InsertMode {
        InsertMode::Literal
    }

    fn queue_inserts<'c>(
        &self,
        queue: &mut FlushQueue<'c, '_>,
        table: &str,
        batch: &TableBatch,
    ) -> Result<(), WriteError> {
        let prefix = sql::insert_prefix(table, batch.column_names());
        for values in batch.rows_to_insert().values() {
            queue.push_statement(FlushKind::Insert, table, sql::literal_insert(&prefix, values))?;
        }
        Ok(())
    }
}

/// One prepared statement per table; every row is bound positionally and
/// added to that statement's batch. Always exactly one job per table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterizedInserts;

impl InsertStrategy for ParameterizedInserts {
    fn mode(&self) -> InsertMode {
        InsertMode::Parameterized
    }

    fn queue_inserts<'c>(
        &self,
        queue: &mut FlushQueue<'c, '_>,
        table: &str,
        batch: &TableBatch,
    ) -> Result<(), WriteError> {
        let statement = sql::parameterized_insert(table, batch.column_names());
        let mut prepared = queue
            .connection()
            .prepare_batch(&statement)
            .map_err(|e| WriteError::failure(table, WritePhase::Prepare, e))?;

        if let Err(e) = bind_rows(prepared.as_mut(), batch) {
            let err = WriteError::failure(table, WritePhase::Insert, e);
            return Err(match prepared.close() {
                Ok(()) => err,
                Err(release) => WriteError::release(release, Some(err)),
            });
        }

        queue.push_job(FlushJob::from_prepared(table, prepared));
        Ok(())
    }
}

fn bind_rows<'c>(
    prepared: &mut (dyn PreparedBatch + 'c),
    batch: &TableBatch,
) -> Result<(), StoreError> {
    for values in batch.rows_to_insert().values() {
        for (i, value) in values.iter().enumerate() {
            prepared.bind(i + 1, value)?;
        }
        prepared.add_batch()?;
    }
    Ok(())
}
