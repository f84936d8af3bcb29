//! Sources scanned to build a resolver on a cache miss.

use rusqlite::{params, Connection};
use writebatch_core::errors::ResolverError;

use crate::resolver::IdResolver;

pub trait SynonymSource {
    fn name(&self) -> &str;

    /// Add every (primary id, synonym) pair to `resolver` under `taxon` and
    /// return the number of pairs read.
    fn scan(&self, taxon: &str, resolver: &mut IdResolver) -> Result<usize, ResolverError>;
}

const ONTOLOGY_SYNONYM_QUERY: &str = "SELECT t.identifier, s.name
     FROM ontologytermsynonyms j, ontologytermsynonym s, ontologyterm t, ontology o
     WHERE t.ontologyid = o.id
       AND o.name = ?1
       AND t.id = j.ontologyterm
       AND j.synonyms = s.id
       AND s.name LIKE ?2";

/// Ontology term synonyms stored in a SQLite production database.
pub struct SqliteOntologySource<'c> {
    conn: &'c Connection,
    name: String,
    ontology: String,
    synonym_pattern: String,
}

impl<'c> SqliteOntologySource<'c> {
    /// Terms of `ontology` whose synonyms match the `LIKE` pattern.
    pub fn new(
        conn: &'c Connection,
        ontology: impl Into<String>,
        synonym_pattern: impl Into<String>,
    ) -> Self {
        let ontology = ontology.into();
        Self {
            conn,
            name: format!("sqlite:{ontology}"),
            ontology,
            synonym_pattern: synonym_pattern.into(),
        }
    }

    /// GO terms with their `GO:` identifier synonyms.
    pub fn gene_ontology(conn: &'c Connection) -> Self {
        Self::new(conn, "GO", "GO:%")
    }
}

impl SynonymSource for SqliteOntologySource<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan(&self, taxon: &str, resolver: &mut IdResolver) -> Result<usize, ResolverError> {
        let source_error = |e: rusqlite::Error| ResolverError::Source {
            source_name: self.name.clone(),
            message: e.to_string(),
        };

        tracing::debug!(ontology = %self.ontology, pattern = %self.synonym_pattern, "scanning synonyms");

        let mut stmt = self
            .conn
            .prepare(ONTOLOGY_SYNONYM_QUERY)
            .map_err(source_error)?;
        let mut rows = stmt
            .query(params![self.ontology, self.synonym_pattern])
            .map_err(source_error)?;

        let mut count = 0;
        while let Some(row) = rows.next().map_err(source_error)? {
            let identifier: String = row.get(0).map_err(source_error)?;
            let synonym: String = row.get(1).map_err(source_error)?;
            resolver.add_main_ids(taxon, &identifier, [synonym]);
            count += 1;
        }

        tracing::info!(source = %self.name, rows = count, "synonym query returned rows");
        Ok(count)
    }
}
