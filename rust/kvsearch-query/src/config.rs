//! Service configuration, emitted by the index build next to the blobs it
//! uploads.

use std::{collections::HashSet, path::Path};

use kvsearch_common::{Result, error::Error, verify_arg};
use kvsearch_engine::NativeEngineOptions;
use kvsearch_packed_index::{CollationKind, LookupTable};
use serde::Deserialize;

/// How stored documents are returned to clients.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentEncoding {
    /// UTF-8 text, returned as a JSON string.
    #[default]
    Text,
    /// A JSON document, returned as is.
    Json,
}

/// A popular term's postings list, stored as a byte range of a shared blob.
///
/// Deserializes from a `[term, blob_id, offset, length]` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PopularTerm {
    pub term: String,
    pub blob_id: u32,
    pub offset: u32,
    pub length: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Longest accepted query string, prefix included.
    pub max_query_bytes: usize,
    /// Most terms across all roles in one query.
    pub max_query_terms: usize,
    /// Most documents returned per query; the engine truncates beyond it.
    pub max_query_results: usize,
    /// Number of document ids, `[0, document_count)`.
    pub document_count: u32,
    pub document_encoding: DocumentEncoding,
    /// Order of text keys in `normal_terms` and its blobs.
    pub collation: CollationKind,
    pub popular_terms: Vec<PopularTerm>,
    pub normal_terms: LookupTable<String>,
    pub documents: LookupTable<u32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_query_bytes: 512,
            max_query_terms: 50,
            max_query_results: 50,
            document_count: 0,
            document_encoding: DocumentEncoding::Text,
            collation: CollationKind::Binary,
            popular_terms: Vec::new(),
            normal_terms: LookupTable::default(),
            documents: LookupTable::default(),
        }
    }
}

impl SearchConfig {
    pub fn from_json(json: &str) -> Result<SearchConfig> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<SearchConfig> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn load(path: &Path) -> Result<SearchConfig> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        let config = Self::from_json(&json)?;
        log::info!(
            "Loaded {}: {} popular terms, {} term packages, {} document packages",
            path.display(),
            config.popular_terms.len(),
            config.normal_terms.len(),
            config.documents.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        verify_arg!(max_query_results, self.max_query_results <= u8::MAX as usize);
        verify_arg!(max_query_terms, self.max_query_terms > 0);

        let collation = self.collation.create();
        self.normal_terms.validate(collation.as_ref())?;
        self.documents.validate(collation.as_ref())?;

        let mut seen = HashSet::with_capacity(self.popular_terms.len());
        for popular in &self.popular_terms {
            if !seen.insert(popular.term.as_str()) {
                return Err(Error::invalid_arg(
                    "popular_terms",
                    format!("duplicate term \"{}\"", popular.term),
                ));
            }
        }
        Ok(())
    }

    /// Engine options matching this configuration.
    pub fn engine_options(&self, memory_size: usize) -> NativeEngineOptions {
        NativeEngineOptions {
            memory_size,
            max_results: self.max_query_results,
            document_count: self.document_count,
            max_query_terms: self.max_query_terms,
        }
    }
}
