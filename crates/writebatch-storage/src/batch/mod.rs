//! Batched bulk writes: table batches in, ordered flush jobs out.

pub mod executor;
pub mod flush;
pub mod queue;
pub mod sql;
pub mod strategy;
pub mod table;
pub mod writer;

pub use executor::{execute_jobs, ExecutionStats};
pub use flush::FlushJob;
pub use queue::FlushQueue;
pub use strategy::{strategy_for, InsertStrategy, LiteralInserts, ParameterizedInserts};
pub use table::TableBatch;
pub use writer::{BatchWriter, WriteStats};
