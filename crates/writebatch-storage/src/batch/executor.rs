//! Draining flush jobs in sequence order.

use writebatch_core::errors::WriteError;
use writebatch_core::types::FlushKind;

use super::flush::FlushJob;

/// Statistics from executing a job sequence.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionStats {
    pub jobs: usize,
    pub rows_deleted: usize,
    pub rows_inserted: usize,
}

/// Execute and release every job in order, stopping at the first failure.
///
/// The failed job is released before returning; if that release fails too,
/// both errors are reported. Jobs after the failure are dropped unexecuted.
pub fn execute_jobs<'c, I>(jobs: I) -> Result<ExecutionStats, WriteError>
where
    I: IntoIterator<Item = FlushJob<'c>>,
{
    let mut stats = ExecutionStats::default();

    for mut job in jobs {
        let affected = match job.execute() {
            Ok(counts) => counts.iter().sum::<usize>(),
            Err(err) => {
                tracing::warn!(kind = %job.kind(), tables = ?job.tables(), error = %err, "flush job failed");
                return Err(match job.release() {
                    Ok(()) => err,
                    Err(release) => WriteError::release(release, Some(err)),
                });
            }
        };

        match job.kind() {
            FlushKind::Delete => stats.rows_deleted += affected,
            FlushKind::Insert => stats.rows_inserted += affected,
        }
        job.close()?;
        stats.jobs += 1;
    }

    tracing::debug!(
        jobs = stats.jobs,
        rows_deleted = stats.rows_deleted,
        rows_inserted = stats.rows_inserted,
        "flush jobs executed"
    );
    Ok(stats)
}
