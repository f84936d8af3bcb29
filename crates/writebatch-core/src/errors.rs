//! Error taxonomy for the writebatch crates.

use std::path::PathBuf;

use crate::types::WritePhase;

/// Errors raised by a store connection or one of its statements.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {message}")]
    SqliteError { message: String },

    #[error("bind index {index} out of range for {parameters} parameters")]
    BindOutOfRange { index: usize, parameters: usize },

    #[error("parameter {index} is not bound")]
    UnboundParameter { index: usize },

    #[error("store i/o error: {message}")]
    Io { message: String },
}

/// Errors surfaced by the batch writer and by flush job execution.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("row {row_id} of table {table} has {actual} values for {expected} columns")]
    ShapeMismatch {
        table: String,
        row_id: i64,
        expected: usize,
        actual: usize,
    },

    #[error("{phase} failed for table {table}: {source}")]
    WriteFailure {
        table: String,
        phase: WritePhase,
        #[source]
        source: StoreError,
    },

    #[error("failed to release statement: {source}{}", prior_suffix(.prior))]
    ResourceReleaseFailure {
        #[source]
        source: StoreError,
        prior: Option<Box<WriteError>>,
    },
}

fn prior_suffix(prior: &Option<Box<WriteError>>) -> String {
    match prior {
        Some(err) => format!(" (while handling: {err})"),
        None => String::new(),
    }
}

impl WriteError {
    pub fn failure(table: impl Into<String>, phase: WritePhase, source: StoreError) -> Self {
        WriteError::WriteFailure {
            table: table.into(),
            phase,
            source,
        }
    }

    /// Combine a release failure with the error that triggered the release.
    pub fn release(source: StoreError, prior: Option<WriteError>) -> Self {
        WriteError::ResourceReleaseFailure {
            source,
            prior: prior.map(Box::new),
        }
    }
}

/// Errors raised while building, reading, or persisting an ID resolver.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolverError {
    #[error("cache file {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("cache file {} line {line}: {message}", .path.display())]
    Serialization {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("source {source_name} failed: {message}")]
    Source { source_name: String, message: String },

    #[error("invalid cache record: {message}")]
    InvalidRecord { message: String },
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("failed to parse config: {message}")]
    Parse { message: String },

    #[error("invalid config value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}
