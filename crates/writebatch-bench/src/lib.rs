//! Fixtures shared by the writebatch benchmarks.

use std::collections::BTreeMap;

use rusqlite::Connection;
use writebatch_core::errors::{StoreError, WriteError};
use writebatch_core::types::InsertMode;
use writebatch_storage::{execute_in_transaction, open_in_memory, BatchWriter, TableBatch};

pub const GENE_COLUMNS: [&str; 4] = ["id", "symbol", "length", "score"];

/// In-memory store with a `gene` table matching [`GENE_COLUMNS`].
pub fn gene_store() -> Result<Connection, StoreError> {
    let conn = open_in_memory()?;
    conn.execute_batch(
        "CREATE TABLE gene (id INTEGER PRIMARY KEY, symbol TEXT, length INTEGER, score REAL)",
    )
    .map_err(|e| StoreError::SqliteError {
        message: e.to_string(),
    })?;
    Ok(conn)
}

/// `rows` inserts into `gene`, each replacing any existing row with the same id.
pub fn gene_batch(rows: i64) -> Result<BTreeMap<String, TableBatch>, WriteError> {
    let mut batch = TableBatch::new("gene", GENE_COLUMNS);
    for id in 0..rows {
        batch.add_delete(id);
        batch.add_insert(
            id,
            vec![
                id.into(),
                format!("CG{id:05}").into(),
                (id * 37 % 9_000).into(),
                (id as f64 / 7.0).into(),
            ],
        )?;
    }
    Ok(BTreeMap::from([("gene".to_string(), batch)]))
}

/// Batch and execute `rows` gene rows in one transaction.
pub fn write_genes(
    conn: &Connection,
    mode: InsertMode,
    max_batch_size: usize,
    rows: i64,
) -> Result<usize, WriteError> {
    let writer = BatchWriter::with_mode(max_batch_size, mode);
    let mut tables = gene_batch(rows)?;
    let jobs = writer.write(conn, &mut tables)?;
    let stats = execute_in_transaction(conn, jobs)?;
    Ok(stats.rows_inserted)
}
