//! The shared statement accumulator of one write call.
//!
//! Deletes and literal inserts go through [`FlushQueue::push_statement`],
//! which seals a job every `max_batch_size` statements. Prepared insert
//! jobs are handed over whole with [`FlushQueue::push_job`].

use writebatch_core::errors::WriteError;
use writebatch_core::events::{JobSealedEvent, WriteEventHandler};
use writebatch_core::types::{FlushKind, WritePhase};

use super::flush::FlushJob;
use super::writer::WriteStats;
use crate::store::{StatementBatch, StoreConnection};

struct OpenBatch<'c> {
    kind: FlushKind,
    tables: Vec<String>,
    batch: Box<dyn StatementBatch + 'c>,
}

pub struct FlushQueue<'c, 'a> {
    conn: &'c dyn StoreConnection,
    max_batch_size: usize,
    open: Option<OpenBatch<'c>>,
    jobs: &'a mut Vec<FlushJob<'c>>,
    events: &'a dyn WriteEventHandler,
    pub(crate) stats: WriteStats,
}

fn phase_of(kind: FlushKind) -> WritePhase {
    match kind {
        FlushKind::Delete => WritePhase::Delete,
        FlushKind::Insert => WritePhase::Insert,
    }
}

impl<'c, 'a> FlushQueue<'c, 'a> {
    pub(crate) fn new(
        conn: &'c dyn StoreConnection,
        max_batch_size: usize,
        jobs: &'a mut Vec<FlushJob<'c>>,
        events: &'a dyn WriteEventHandler,
    ) -> Self {
        Self {
            conn,
            max_batch_size: max_batch_size.max(1),
            open: None,
            jobs,
            events,
            stats: WriteStats::default(),
        }
    }

    pub fn connection(&self) -> &'c dyn StoreConnection {
        self.conn
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Append one statement to the open accumulator, sealing it when full.
    /// An accumulator of a different kind is sealed first.
    pub fn push_statement(
        &mut self,
        kind: FlushKind,
        table: &str,
        sql: String,
    ) -> Result<(), WriteError> {
        if self.open.as_ref().is_some_and(|open| open.kind != kind) {
            self.seal()?;
        }

        let mut open = match self.open.take() {
            Some(open) => open,
            None => OpenBatch {
                kind,
                tables: Vec::new(),
                batch: self
                    .conn
                    .create_statement_batch()
                    .map_err(|e| WriteError::failure(table, phase_of(kind), e))?,
            },
        };

        let added = open.batch.add(sql);
        if open.tables.last().map(String::as_str) != Some(table) {
            open.tables.push(table.to_string());
        }
        let full = open.batch.len() >= self.max_batch_size;
        // Put it back first so an abort still releases it.
        self.open = Some(open);

        added.map_err(|e| WriteError::failure(table, phase_of(kind), e))?;
        if full {
            self.seal()?;
        }
        Ok(())
    }

    /// Seal the open accumulator, if any, into a job.
    pub fn seal(&mut self) -> Result<(), WriteError> {
        let Some(open) = self.open.take() else {
            return Ok(());
        };
        if open.batch.is_empty() {
            return open.batch.close().map_err(|e| WriteError::release(e, None));
        }
        self.push_job(FlushJob::from_statements(open.kind, open.tables, open.batch));
        Ok(())
    }

    pub fn push_job(&mut self, job: FlushJob<'c>) {
        match job.kind() {
            FlushKind::Delete => self.stats.delete_jobs += 1,
            FlushKind::Insert => self.stats.insert_jobs += 1,
        }
        self.events.on_job_sealed(&JobSealedEvent {
            kind: job.kind(),
            tables: job.tables(),
            entries: job.entry_count(),
            sequence: self.stats.delete_jobs + self.stats.insert_jobs - 1,
        });
        self.jobs.push(job);
    }

    /// Release whatever is still open and return the error to propagate.
    pub(crate) fn abort(mut self, err: WriteError) -> WriteError {
        match self.open.take() {
            Some(open) => match open.batch.close() {
                Ok(()) => err,
                Err(release) => WriteError::release(release, Some(err)),
            },
            None => err,
        }
    }
}
