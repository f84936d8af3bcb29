//! Defaults shared across crates.

/// Number of statements accumulated before a batch is sealed.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 500;

/// Column matched by generated `DELETE` statements.
pub const DEFAULT_ID_COLUMN: &str = "id";

/// Directory holding resolver cache files.
pub const DEFAULT_CACHE_DIR: &str = "build";

/// Store name used to key resolver cache files.
pub const DEFAULT_STORE_NAME: &str = "production";

/// Config file looked up under the project root.
pub const CONFIG_FILE_NAME: &str = "writebatch.toml";

/// Log filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info";
