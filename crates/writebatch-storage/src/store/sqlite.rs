//! `StoreConnection` for `rusqlite::Connection`.
//!
//! SQLite has no native statement batch, so both batch kinds queue their
//! entries in memory and run them one by one on `execute`.

use rusqlite::{params_from_iter, Connection, Statement};
use writebatch_core::errors::StoreError;

use super::{PreparedBatch, StatementBatch, StoreConnection};
use crate::value::SqlValue;

pub(crate) fn sqlite_error(e: rusqlite::Error) -> StoreError {
    StoreError::SqliteError {
        message: e.to_string(),
    }
}

impl StoreConnection for Connection {
    fn create_statement_batch(&self) -> Result<Box<dyn StatementBatch + '_>, StoreError> {
        Ok(Box::new(SqliteStatementBatch {
            conn: self,
            statements: Vec::new(),
        }))
    }

    fn prepare_batch(&self, sql: &str) -> Result<Box<dyn PreparedBatch + '_>, StoreError> {
        let stmt = self.prepare(sql).map_err(sqlite_error)?;
        let parameters = stmt.parameter_count();
        Ok(Box::new(SqlitePreparedBatch {
            stmt,
            sql: sql.to_string(),
            current: vec![None; parameters],
            rows: Vec::new(),
        }))
    }
}

pub struct SqliteStatementBatch<'c> {
    conn: &'c Connection,
    statements: Vec<String>,
}

impl StatementBatch for SqliteStatementBatch<'_> {
    fn add(&mut self, sql: String) -> Result<(), StoreError> {
        self.statements.push(sql);
        Ok(())
    }

    fn statements(&self) -> &[String] {
        &self.statements
    }

    fn execute(&mut self) -> Result<Vec<usize>, StoreError> {
        let mut counts = Vec::with_capacity(self.statements.len());
        for sql in &self.statements {
            counts.push(self.conn.execute(sql, ()).map_err(sqlite_error)?);
        }
        self.statements.clear();
        Ok(counts)
    }

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

pub struct SqlitePreparedBatch<'c> {
    stmt: Statement<'c>,
    sql: String,
    current: Vec<Option<SqlValue>>,
    rows: Vec<Vec<SqlValue>>,
}

impl PreparedBatch for SqlitePreparedBatch<'_> {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn parameter_count(&self) -> usize {
        self.current.len()
    }

    fn bind(&mut self, index: usize, value: &SqlValue) -> Result<(), StoreError> {
        let parameters = self.current.len();
        match index.checked_sub(1).and_then(|i| self.current.get_mut(i)) {
            Some(slot) => {
                *slot = Some(value.clone());
                Ok(())
            }
            None => Err(StoreError::BindOutOfRange { index, parameters }),
        }
    }

    fn add_batch(&mut self) -> Result<(), StoreError> {
        if let Some(unbound) = self.current.iter().position(Option::is_none) {
            return Err(StoreError::UnboundParameter { index: unbound + 1 });
        }
        let row = self
            .current
            .iter_mut()
            .map(|slot| slot.take().unwrap_or(SqlValue::Null))
            .collect();
        self.rows.push(row);
        Ok(())
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn execute(&mut self) -> Result<Vec<usize>, StoreError> {
        let mut counts = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            counts.push(
                self.stmt
                    .execute(params_from_iter(row.iter()))
                    .map_err(sqlite_error)?,
            );
        }
        self.rows.clear();
        Ok(counts)
    }

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        self.stmt.finalize().map_err(sqlite_error)
    }
}
