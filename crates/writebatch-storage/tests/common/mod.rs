//! A store that records every call and fails on demand.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use writebatch_core::errors::StoreError;
use writebatch_storage::{PreparedBatch, SqlValue, StatementBatch, StoreConnection};

#[derive(Default)]
pub struct RecordingStore {
    pub calls: RefCell<Vec<String>>,
    /// Fail `add` once this many statements were added across all batches.
    pub fail_add_after: Cell<Option<usize>>,
    pub fail_prepare: Cell<bool>,
    pub fail_bind: Cell<bool>,
    pub fail_close: Cell<bool>,
    pub fail_execute: Cell<bool>,
    added: Cell<usize>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    fn injected(message: &str) -> StoreError {
        StoreError::SqliteError {
            message: message.to_string(),
        }
    }
}

impl StoreConnection for RecordingStore {
    fn create_statement_batch(&self) -> Result<Box<dyn StatementBatch + '_>, StoreError> {
        self.record("create_batch");
        Ok(Box::new(FakeStatementBatch {
            store: self,
            statements: Vec::new(),
        }))
    }

    fn prepare_batch(&self, sql: &str) -> Result<Box<dyn PreparedBatch + '_>, StoreError> {
        self.record(format!("prepare {sql}"));
        if self.fail_prepare.get() {
            return Err(Self::injected("prepare failed"));
        }
        Ok(Box::new(FakePreparedBatch {
            store: self,
            sql: sql.to_string(),
            parameters: sql.matches('?').count(),
            rows: 0,
        }))
    }
}

pub struct FakeStatementBatch<'s> {
    store: &'s RecordingStore,
    statements: Vec<String>,
}

impl StatementBatch for FakeStatementBatch<'_> {
    fn add(&mut self, sql: String) -> Result<(), StoreError> {
        let added = self.store.added.get();
        if self.store.fail_add_after.get() == Some(added) {
            return Err(RecordingStore::injected("add failed"));
        }
        self.store.added.set(added + 1);
        self.statements.push(sql);
        Ok(())
    }

    fn statements(&self) -> &[String] {
        &self.statements
    }

    fn execute(&mut self) -> Result<Vec<usize>, StoreError> {
        for sql in &self.statements {
            self.store.record(format!("execute {sql}"));
        }
        if self.store.fail_execute.get() {
            return Err(RecordingStore::injected("execute failed"));
        }
        Ok(self.statements.drain(..).map(|_| 1).collect())
    }

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        self.store.record("close batch");
        if self.store.fail_close.get() {
            return Err(RecordingStore::injected("close failed"));
        }
        Ok(())
    }
}

pub struct FakePreparedBatch<'s> {
    store: &'s RecordingStore,
    sql: String,
    parameters: usize,
    rows: usize,
}

impl PreparedBatch for FakePreparedBatch<'_> {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn parameter_count(&self) -> usize {
        self.parameters
    }

    fn bind(&mut self, index: usize, _value: &SqlValue) -> Result<(), StoreError> {
        if self.store.fail_bind.get() {
            return Err(RecordingStore::injected("bind failed"));
        }
        if index == 0 || index > self.parameters {
            return Err(StoreError::BindOutOfRange {
                index,
                parameters: self.parameters,
            });
        }
        Ok(())
    }

    fn add_batch(&mut self) -> Result<(), StoreError> {
        self.rows += 1;
        Ok(())
    }

    fn len(&self) -> usize {
        self.rows
    }

    fn execute(&mut self) -> Result<Vec<usize>, StoreError> {
        self.store.record(format!("execute prepared {} x{}", self.sql, self.rows));
        if self.store.fail_execute.get() {
            return Err(RecordingStore::injected("execute failed"));
        }
        let counts = vec![1; self.rows];
        self.rows = 0;
        Ok(counts)
    }

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        self.store.record("close prepared");
        if self.store.fail_close.get() {
            return Err(RecordingStore::injected("close failed"));
        }
        Ok(())
    }
}
