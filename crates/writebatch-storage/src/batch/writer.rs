//! BatchWriter: turns pending table batches into ordered flush jobs.
//!
//! All deletes are queued and sealed before the first insert is queued, so a
//! row deleted and re-inserted in the same cycle never collides with itself.

use std::collections::BTreeMap;
use std::sync::Arc;

use writebatch_core::config::WriterConfig;
use writebatch_core::constants::DEFAULT_ID_COLUMN;
use writebatch_core::errors::WriteError;
use writebatch_core::events::{TracingEvents, WriteCompletedEvent, WriteEventHandler};
use writebatch_core::types::{FlushKind, InsertMode};

use super::flush::FlushJob;
use super::queue::FlushQueue;
use super::sql;
use super::strategy::{strategy_for, InsertStrategy};
use super::table::TableBatch;
use crate::store::StoreConnection;

/// Counters for one write call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    pub tables: usize,
    pub deletes: usize,
    pub inserts: usize,
    pub delete_jobs: usize,
    pub insert_jobs: usize,
}

impl WriteStats {
    pub fn jobs(&self) -> usize {
        self.delete_jobs + self.insert_jobs
    }
}

impl From<WriteStats> for WriteCompletedEvent {
    fn from(stats: WriteStats) -> Self {
        WriteCompletedEvent {
            tables: stats.tables,
            deletes: stats.deletes,
            inserts: stats.inserts,
            delete_jobs: stats.delete_jobs,
            insert_jobs: stats.insert_jobs,
        }
    }
}

/// When pending deletes leave their batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drain {
    /// After the delete phase is sealed; the caller holds the jobs.
    PerPhase,
    /// Only once both phases are sealed.
    OnSuccess,
}

pub struct BatchWriter {
    max_batch_size: usize,
    id_column: String,
    strategy: Box<dyn InsertStrategy>,
    events: Arc<dyn WriteEventHandler>,
}

impl BatchWriter {
    pub fn new(config: &WriterConfig) -> Self {
        Self::with_strategy(config, strategy_for(config.insert_strategy))
    }

    pub fn with_strategy(config: &WriterConfig, strategy: Box<dyn InsertStrategy>) -> Self {
        Self {
            max_batch_size: config.max_batch_size.max(1),
            id_column: config.id_column.clone(),
            strategy,
            events: Arc::new(TracingEvents),
        }
    }

    /// Writer with the given threshold and strategy, deleting by `id`.
    pub fn with_mode(max_batch_size: usize, mode: InsertMode) -> Self {
        Self::new(&WriterConfig {
            max_batch_size,
            insert_strategy: mode,
            id_column: DEFAULT_ID_COLUMN.to_string(),
        })
    }

    pub fn with_events(mut self, events: Arc<dyn WriteEventHandler>) -> Self {
        self.events = events;
        self
    }

    pub fn mode(&self) -> InsertMode {
        self.strategy.mode()
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Batch every pending delete and insert of `tables` into flush jobs.
    ///
    /// Map keys name the target tables. On success every batch is drained
    /// and the jobs are returned deletes first, then inserts in table order.
    /// On failure no job reaches the caller, so every batch keeps its
    /// pending deletes and inserts for a retry.
    pub fn write<'c>(
        &self,
        conn: &'c dyn StoreConnection,
        tables: &mut BTreeMap<String, TableBatch>,
    ) -> Result<Vec<FlushJob<'c>>, WriteError> {
        let mut jobs = Vec::new();
        self.write_jobs(conn, tables, &mut jobs, Drain::OnSuccess)?;
        Ok(jobs)
    }

    /// Like [`write`](Self::write), but appends to a caller-owned vector.
    ///
    /// Jobs sealed before a failure stay in `jobs` and remain executable.
    /// Statements still open at the failure are released before returning;
    /// pending rows of a failed phase are left in their batches. Deletes are
    /// drained once their jobs are in `jobs`, even if inserts then fail.
    pub fn write_into<'c>(
        &self,
        conn: &'c dyn StoreConnection,
        tables: &mut BTreeMap<String, TableBatch>,
        jobs: &mut Vec<FlushJob<'c>>,
    ) -> Result<WriteStats, WriteError> {
        self.write_jobs(conn, tables, jobs, Drain::PerPhase)
    }

    fn write_jobs<'c>(
        &self,
        conn: &'c dyn StoreConnection,
        tables: &mut BTreeMap<String, TableBatch>,
        jobs: &mut Vec<FlushJob<'c>>,
        drain: Drain,
    ) -> Result<WriteStats, WriteError> {
        if let Err(err) = tables.values().try_for_each(TableBatch::validate) {
            self.events.on_write_failed(&err);
            return Err(err);
        }

        tracing::debug!(
            tables = tables.len(),
            mode = %self.mode(),
            max_batch_size = self.max_batch_size,
            "writing table batches"
        );

        let mut queue = FlushQueue::new(conn, self.max_batch_size, jobs, self.events.as_ref());
        match self.run_phases(&mut queue, tables, drain) {
            Ok(()) => {
                let stats = queue.stats;
                self.events.on_write_completed(&stats.into());
                Ok(stats)
            }
            Err(err) => {
                let err = queue.abort(err);
                self.events.on_write_failed(&err);
                Err(err)
            }
        }
    }

    fn run_phases(
        &self,
        queue: &mut FlushQueue<'_, '_>,
        tables: &mut BTreeMap<String, TableBatch>,
        drain: Drain,
    ) -> Result<(), WriteError> {
        queue.stats.tables = tables.len();

        for (name, batch) in tables.iter() {
            for id in batch.ids_to_delete() {
                let statement = sql::delete_statement(name, &self.id_column, *id);
                queue.push_statement(FlushKind::Delete, name, statement)?;
            }
            queue.stats.deletes += batch.pending_deletes();
        }
        queue.seal()?;
        if drain == Drain::PerPhase {
            tables.values_mut().for_each(TableBatch::clear_deletes);
        }

        for (name, batch) in tables.iter() {
            if !batch.has_inserts() {
                continue;
            }
            self.strategy.queue_inserts(queue, name, batch)?;
            queue.stats.inserts += batch.pending_inserts();
        }
        queue.seal()?;
        if drain == Drain::OnSuccess {
            tables.values_mut().for_each(TableBatch::clear_deletes);
        }
        tables.values_mut().for_each(TableBatch::clear_inserts);

        Ok(())
    }
}

impl Default for BatchWriter {
    fn default() -> Self {
        Self::new(&WriterConfig::default())
    }
}
