//! # writebatch-storage
//!
//! Batched bulk writes for relational stores. Callers fill [`TableBatch`]es,
//! [`BatchWriter::write`] turns them into ordered [`FlushJob`]s (all deletes
//! before any insert), and the jobs are executed in that order.
//! SQLite is supported through `rusqlite`; other stores plug in through
//! [`store::StoreConnection`].

pub mod batch;
pub mod connection;
pub mod store;
pub mod value;

pub use batch::{
    execute_jobs, BatchWriter, ExecutionStats, FlushJob, InsertStrategy, LiteralInserts,
    ParameterizedInserts, TableBatch, WriteStats,
};
pub use connection::{execute_in_transaction, open_in_memory, open_store};
pub use store::{PreparedBatch, StatementBatch, StoreConnection};
pub use value::SqlValue;
