//! In-process memo of built resolvers using Moka.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use moka::sync::Cache;
use writebatch_core::errors::ResolverError;

use crate::factory::OntologyResolverFactory;
use crate::resolver::IdResolver;
use crate::source::SynonymSource;

/// Shares one built resolver per cache file across callers. Entries are
/// keyed by the full cache path, so the same store and category under two
/// cache directories stay separate.
pub struct ResolverRegistry {
    inner: Cache<PathBuf, Arc<IdResolver>>,
}

impl ResolverRegistry {
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::new(capacity),
        }
    }

    /// Return the resolver for the factory's cache file, building it on first use.
    /// Concurrent callers for the same key wait for a single build.
    pub fn get_or_build(
        &self,
        factory: &OntologyResolverFactory,
        source: &dyn SynonymSource,
    ) -> Result<Arc<IdResolver>, ResolverError> {
        self.inner
            .try_get_with(factory.cache_path(), || factory.build(source).map(Arc::new))
            .map_err(|e| (*e).clone())
    }

    pub fn get(&self, cache_path: &Path) -> Option<Arc<IdResolver>> {
        self.inner.get(cache_path)
    }

    pub fn invalidate(&self, cache_path: &Path) {
        self.inner.invalidate(cache_path);
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::new(64)
    }
}
