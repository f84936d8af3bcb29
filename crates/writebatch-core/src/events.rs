//! Observability sinks injected into the writer and the resolver factory.
//!
//! Every method has a no-op default so handlers only override what they
//! care about. [`TracingEvents`] forwards everything to `tracing`.

use std::path::Path;

use crate::errors::WriteError;
use crate::types::FlushKind;

/// A job was sealed and handed to the caller.
#[derive(Debug, Clone)]
pub struct JobSealedEvent<'a> {
    pub kind: FlushKind,
    pub tables: &'a [String],
    pub entries: usize,
    /// Position of the job in the sequence produced by this write call.
    pub sequence: usize,
}

/// A write call finished successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteCompletedEvent {
    pub tables: usize,
    pub deletes: usize,
    pub inserts: usize,
    pub delete_jobs: usize,
    pub insert_jobs: usize,
}

pub trait WriteEventHandler: Send + Sync {
    fn on_job_sealed(&self, _event: &JobSealedEvent<'_>) {}
    fn on_write_completed(&self, _event: &WriteCompletedEvent) {}
    fn on_write_failed(&self, _error: &WriteError) {}
}

pub trait ResolverEventHandler: Send + Sync {
    fn on_cache_read(&self, _path: &Path, _entries: usize) {}
    fn on_cache_miss(&self, _path: &Path) {}
    fn on_source_scanned(&self, _source: &str, _rows: usize) {}
    fn on_cache_written(&self, _path: &Path, _entries: usize) {}
}

/// Handler that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEvents;

impl WriteEventHandler for NoOpEvents {}
impl ResolverEventHandler for NoOpEvents {}

/// Handler that logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEvents;

impl WriteEventHandler for TracingEvents {
    fn on_job_sealed(&self, event: &JobSealedEvent<'_>) {
        tracing::debug!(
            kind = %event.kind,
            tables = ?event.tables,
            entries = event.entries,
            sequence = event.sequence,
            "flush job sealed"
        );
    }

    fn on_write_completed(&self, event: &WriteCompletedEvent) {
        tracing::info!(
            tables = event.tables,
            deletes = event.deletes,
            inserts = event.inserts,
            delete_jobs = event.delete_jobs,
            insert_jobs = event.insert_jobs,
            "write batched"
        );
    }

    fn on_write_failed(&self, error: &WriteError) {
        tracing::warn!(error = %error, "write aborted");
    }
}

impl ResolverEventHandler for TracingEvents {
    fn on_cache_read(&self, path: &Path, entries: usize) {
        tracing::info!(path = %path.display(), entries, "resolver read from cache file");
    }

    fn on_cache_miss(&self, path: &Path) {
        tracing::info!(path = %path.display(), "resolver cache miss, scanning source");
    }

    fn on_source_scanned(&self, source: &str, rows: usize) {
        tracing::info!(source, rows, "resolver source scanned");
    }

    fn on_cache_written(&self, path: &Path, entries: usize) {
        tracing::info!(path = %path.display(), entries, "resolver cached to file");
    }
}
