//! IdResolver: per-taxon primary id ↔ synonym lookup.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use writebatch_core::errors::ResolverError;

type IdIndex = FxHashMap<String, FxHashMap<String, BTreeSet<String>>>;

/// One line of a cache file: a primary id and all of its synonyms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub taxon: String,
    pub primary: String,
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IdResolver {
    class_name: String,
    /// taxon → primary id → synonyms
    main_ids: IdIndex,
    /// taxon → synonym → primary ids
    reverse: IdIndex,
}

impl IdResolver {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Record `synonyms` for `primary` under `taxon`. Repeated calls add up.
    pub fn add_main_ids<I, S>(&mut self, taxon: &str, primary: &str, synonyms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self
            .main_ids
            .entry(taxon.to_string())
            .or_default()
            .entry(primary.to_string())
            .or_default();
        let reverse = self.reverse.entry(taxon.to_string()).or_default();

        for synonym in synonyms {
            let synonym = synonym.into();
            reverse
                .entry(synonym.clone())
                .or_default()
                .insert(primary.to_string());
            entry.insert(synonym);
        }
    }

    /// Synonyms of `key` under `taxon`.
    pub fn resolve(&self, taxon: &str, key: &str) -> Option<&BTreeSet<String>> {
        self.main_ids.get(taxon)?.get(key)
    }

    /// Primary ids that list `synonym` under `taxon`.
    pub fn primaries_for(&self, taxon: &str, synonym: &str) -> Option<&BTreeSet<String>> {
        self.reverse.get(taxon)?.get(synonym)
    }

    pub fn has_taxon(&self, taxon: &str) -> bool {
        self.main_ids.contains_key(taxon)
    }

    pub fn taxons(&self) -> impl Iterator<Item = &str> {
        self.main_ids.keys().map(String::as_str)
    }

    /// Number of primary ids under `taxon`.
    pub fn count(&self, taxon: &str) -> usize {
        self.main_ids.get(taxon).map_or(0, FxHashMap::len)
    }

    /// Number of primary ids across all taxons.
    pub fn len(&self) -> usize {
        self.main_ids.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add every entry of `other` to `self`.
    pub fn merge(&mut self, other: &IdResolver) {
        for record in other.records() {
            self.add_main_ids(&record.taxon, &record.primary, record.synonyms);
        }
    }

    /// All entries, sorted by taxon then primary id.
    pub fn records(&self) -> Vec<CacheRecord> {
        let mut records: Vec<CacheRecord> = self
            .main_ids
            .iter()
            .flat_map(|(taxon, ids)| {
                ids.iter().map(move |(primary, synonyms)| CacheRecord {
                    taxon: taxon.clone(),
                    primary: primary.clone(),
                    synonyms: synonyms.iter().cloned().collect(),
                })
            })
            .collect();
        records.sort_by(|a, b| (&a.taxon, &a.primary).cmp(&(&b.taxon, &b.primary)));
        records
    }

    /// Write one JSON record per line. The file is written beside `path`
    /// and renamed into place so readers never see a partial cache.
    pub fn write_to_file(&self, path: &Path) -> Result<usize, ResolverError> {
        let io_error = |e: std::io::Error| ResolverError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_error)?;
            }
        }

        let tmp = PathBuf::from(format!("{}.tmp", path.display()));
        let records = self.records();
        let written = write_records(&records, &tmp, path)
            .and_then(|()| std::fs::rename(&tmp, path).map_err(io_error));
        if let Err(err) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(err);
        }

        Ok(records.len())
    }

    pub fn read_from_file(class_name: &str, path: &Path) -> Result<Self, ResolverError> {
        let io_error = |e: std::io::Error| ResolverError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let reader = BufReader::new(File::open(path).map_err(io_error)?);
        let mut resolver = Self::new(class_name);

        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(io_error)?;
            if line.trim().is_empty() {
                continue;
            }
            let record: CacheRecord =
                serde_json::from_str(&line).map_err(|e| ResolverError::Serialization {
                    path: path.to_path_buf(),
                    line: i + 1,
                    message: e.to_string(),
                })?;
            if record.primary.is_empty() {
                return Err(ResolverError::InvalidRecord {
                    message: format!("{} line {}: empty primary id", path.display(), i + 1),
                });
            }
            resolver.add_main_ids(&record.taxon, &record.primary, record.synonyms);
        }

        Ok(resolver)
    }
}

/// Serialize `records` into `tmp`; errors name the final cache `path`.
fn write_records(records: &[CacheRecord], tmp: &Path, path: &Path) -> Result<(), ResolverError> {
    let io_error = |e: std::io::Error| ResolverError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut out = BufWriter::new(File::create(tmp).map_err(io_error)?);
    for (i, record) in records.iter().enumerate() {
        serde_json::to_writer(&mut out, record).map_err(|e| ResolverError::Serialization {
            path: path.to_path_buf(),
            line: i + 1,
            message: e.to_string(),
        })?;
        out.write_all(b"\n").map_err(io_error)?;
    }
    out.flush().map_err(io_error)
}
