//! TOML configuration: writer thresholds, resolver cache location, logging.
//!
//! Every section is optional; missing values fall back to the defaults in
//! [`crate::constants`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_CACHE_DIR, DEFAULT_ID_COLUMN, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_BATCH_SIZE, DEFAULT_STORE_NAME,
};
use crate::errors::ConfigError;
use crate::types::InsertMode;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteBatchConfig {
    pub writer: WriterConfig,
    pub resolver: ResolverConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Statements per sealed batch for deletes and literal inserts.
    pub max_batch_size: usize,
    pub insert_strategy: InsertMode,
    pub id_column: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            insert_strategy: InsertMode::default(),
            id_column: DEFAULT_ID_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub cache_dir: PathBuf,
    pub store_name: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            store_name: DEFAULT_STORE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl WriteBatchConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `writebatch.toml` from `root`, or from `override_path` when given.
    ///
    /// A missing default file yields the defaults; a missing override is an error.
    pub fn load(root: &Path, override_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match override_path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = root.join(CONFIG_FILE_NAME);
                if !path.exists() {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };

        let source = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Self::from_toml(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.writer.max_batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "writer.max_batch_size",
                message: "must be at least 1".to_string(),
            });
        }
        if self.writer.id_column.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "writer.id_column",
                message: "must not be empty".to_string(),
            });
        }
        if self.resolver.store_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "resolver.store_name",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
