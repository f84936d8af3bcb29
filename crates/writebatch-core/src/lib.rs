//! # writebatch-core
//!
//! Shared foundation for the writebatch crates: error taxonomy,
//! configuration, observability sinks, tracing setup, and the small
//! vocabulary types that cross crate boundaries.

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod telemetry;
pub mod types;

pub use config::WriteBatchConfig;
pub use errors::{ConfigError, ResolverError, StoreError, WriteError};
pub use types::{FlushKind, InsertMode, WritePhase};
