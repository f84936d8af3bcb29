//! OntologyResolverFactory: builds an ontology resolver from its cache file
//! or, on a miss, from a synonym source.

use std::path::PathBuf;
use std::sync::Arc;

use writebatch_core::config::ResolverConfig;
use writebatch_core::errors::ResolverError;
use writebatch_core::events::{ResolverEventHandler, TracingEvents};

use crate::cache::{load_or_build, CacheKey, CacheOrigin};
use crate::resolver::IdResolver;
use crate::source::SynonymSource;

/// Ontologies are not scoped per organism, so every entry is filed under
/// this one taxon.
pub const ONTOLOGY_TAXON: &str = "0";

const CLASS_NAME: &str = "OntologyTerm";

pub struct OntologyResolverFactory {
    key: CacheKey,
    cache_dir: PathBuf,
    events: Arc<dyn ResolverEventHandler>,
}

impl OntologyResolverFactory {
    pub fn new(ontology: impl Into<String>, config: &ResolverConfig) -> Self {
        Self {
            key: CacheKey::new(config.store_name.clone(), ontology),
            cache_dir: config.cache_dir.clone(),
            events: Arc::new(TracingEvents),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn ResolverEventHandler>) -> Self {
        self.events = events;
        self
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn cache_path(&self) -> PathBuf {
        self.key.path_in(&self.cache_dir)
    }

    /// Build the resolver, reading the cache file when present and writing
    /// it after a source scan otherwise.
    pub fn build(&self, source: &dyn SynonymSource) -> Result<IdResolver, ResolverError> {
        self.build_with_origin(source).map(|(resolver, _)| resolver)
    }

    pub fn build_with_origin(
        &self,
        source: &dyn SynonymSource,
    ) -> Result<(IdResolver, CacheOrigin), ResolverError> {
        let path = self.cache_path();
        let events = self.events.as_ref();

        load_or_build(
            &path,
            |path| {
                let resolver = IdResolver::read_from_file(CLASS_NAME, path)?;
                events.on_cache_read(path, resolver.len());
                Ok(resolver)
            },
            || {
                events.on_cache_miss(&path);
                let mut resolver = IdResolver::new(CLASS_NAME);
                let rows = source.scan(ONTOLOGY_TAXON, &mut resolver)?;
                events.on_source_scanned(source.name(), rows);
                Ok(resolver)
            },
            |resolver, path| {
                let entries = resolver.write_to_file(path)?;
                events.on_cache_written(path, entries);
                Ok(())
            },
        )
    }

    /// Load the ontology into an existing resolver unless it already holds
    /// the ontology taxon. Returns whether anything was loaded.
    pub fn ensure_loaded(
        &self,
        resolver: &mut IdResolver,
        source: &dyn SynonymSource,
    ) -> Result<bool, ResolverError> {
        if resolver.has_taxon(ONTOLOGY_TAXON) {
            return Ok(false);
        }
        let built = self.build(source)?;
        resolver.merge(&built);
        Ok(true)
    }
}
