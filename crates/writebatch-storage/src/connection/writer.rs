//! Write transaction utilities: BEGIN IMMEDIATE around a job sequence.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use writebatch_core::errors::WriteError;
use writebatch_core::types::WritePhase;

use crate::batch::{execute_jobs, ExecutionStats, FlushJob};
use crate::store::sqlite::sqlite_error;

const TRANSACTION: &str = "(transaction)";

/// Run `f` inside a BEGIN IMMEDIATE transaction.
/// The write lock is taken at the start, so `f` never hits SQLITE_BUSY
/// half way. An error from `f` rolls the transaction back.
pub fn with_immediate_transaction<F, T>(conn: &Connection, f: F) -> Result<T, WriteError>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, WriteError>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|e| WriteError::failure(TRANSACTION, WritePhase::Execute, sqlite_error(e)))?;

    let result = f(&tx)?;

    tx.commit()
        .map_err(|e| WriteError::failure(TRANSACTION, WritePhase::Execute, sqlite_error(e)))?;

    Ok(result)
}

/// Execute `jobs` in order as one transaction: all of them apply or none.
pub fn execute_in_transaction<'c, I>(
    conn: &Connection,
    jobs: I,
) -> Result<ExecutionStats, WriteError>
where
    I: IntoIterator<Item = FlushJob<'c>>,
{
    with_immediate_transaction(conn, |_| execute_jobs(jobs))
}
