//! Vocabulary types shared by the writer, its errors, and its events.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a sealed flush job does to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlushKind {
    Delete,
    Insert,
}

impl fmt::Display for FlushKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushKind::Delete => f.write_str("delete"),
            FlushKind::Insert => f.write_str("insert"),
        }
    }
}

/// Where in a write cycle a store error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePhase {
    Delete,
    Insert,
    Prepare,
    Execute,
}

impl fmt::Display for WritePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WritePhase::Delete => "delete",
            WritePhase::Insert => "insert",
            WritePhase::Prepare => "prepare",
            WritePhase::Execute => "execute",
        };
        f.write_str(name)
    }
}

/// How pending inserts are turned into batch entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertMode {
    /// Values rendered into SQL text, one statement per row.
    Literal,
    /// One prepared statement per table with positionally bound values.
    #[default]
    Parameterized,
}

impl fmt::Display for InsertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertMode::Literal => f.write_str("literal"),
            InsertMode::Parameterized => f.write_str("parameterized"),
        }
    }
}
