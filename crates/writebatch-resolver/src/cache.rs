//! Cache file naming and the load-or-build step.

use std::fmt;
use std::path::{Path, PathBuf};

use writebatch_core::errors::ResolverError;

/// Identifies one cache file: the store scanned and the category resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub store_name: String,
    pub category: String,
}

impl CacheKey {
    pub fn new(store_name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            category: category.into(),
        }
    }

    /// `<store_name>.<category>`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.store_name, self.category)
    }

    pub fn path_in(&self, cache_dir: &Path) -> PathBuf {
        cache_dir.join(self.file_name())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Where a loaded value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOrigin {
    File,
    Built,
}

/// Read `path` with `load` if it exists; otherwise `build` the value and
/// `persist` it to `path` so the next run can read it.
pub fn load_or_build<T, L, B, P>(
    path: &Path,
    load: L,
    build: B,
    persist: P,
) -> Result<(T, CacheOrigin), ResolverError>
where
    L: FnOnce(&Path) -> Result<T, ResolverError>,
    B: FnOnce() -> Result<T, ResolverError>,
    P: FnOnce(&T, &Path) -> Result<(), ResolverError>,
{
    if path.is_file() {
        return Ok((load(path)?, CacheOrigin::File));
    }

    let value = build()?;
    persist(&value, path)?;
    Ok((value, CacheOrigin::Built))
}
