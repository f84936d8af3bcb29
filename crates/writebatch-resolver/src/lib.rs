//! # writebatch-resolver
//!
//! Ontology ID resolution backed by a file cache: the first run scans a
//! source database and writes `<cache_dir>/<store>.<ontology>`, later runs
//! read that file instead of querying again.

pub mod cache;
pub mod factory;
pub mod registry;
pub mod resolver;
pub mod source;

pub use cache::{load_or_build, CacheKey, CacheOrigin};
pub use factory::{OntologyResolverFactory, ONTOLOGY_TAXON};
pub use registry::ResolverRegistry;
pub use resolver::{CacheRecord, IdResolver};
pub use source::{SqliteOntologySource, SynonymSource};
