//! Opening SQLite stores and running flush jobs inside transactions.

pub mod writer;

use std::path::Path;

use rusqlite::Connection;
use writebatch_core::errors::StoreError;

use crate::store::sqlite::sqlite_error;

pub use writer::{execute_in_transaction, with_immediate_transaction};

/// Open (or create) a file-backed store, creating parent directories.
pub fn open_store(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                message: format!("failed to create {}: {e}", parent.display()),
            })?;
        }
    }

    let conn = Connection::open(path).map_err(sqlite_error)?;
    // journal_mode reports the resulting mode as a row.
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .map_err(sqlite_error)?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(sqlite_error)?;
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(sqlite_error)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(sqlite_error)?;
    tracing::debug!(path = %path.display(), "opened store");
    Ok(conn)
}

/// Open a private in-memory store. WAL does not apply to memory databases.
pub fn open_in_memory() -> Result<Connection, StoreError> {
    let conn = Connection::open_in_memory().map_err(sqlite_error)?;
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(sqlite_error)?;
    Ok(conn)
}
