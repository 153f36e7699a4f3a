use std::sync::Arc;

use futures::future::try_join_all;
use kvsearch_common::{Result, error::Error};
use kvsearch_engine::{
    ByRole, DiagnosticHost, EngineHost, EnginePool, QueryResult, build_query_request,
    execute_query, request_size,
};
use kvsearch_kvstore::{KvStore, keys};
use kvsearch_packed_index::{Collation, PackedIndexReader};
use serde::Serialize;

use crate::{
    config::{DocumentEncoding, SearchConfig},
    parser::parse_query,
    resolver::TermResolver,
};

/// Response body of a successful search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub results: Vec<serde_json::Value>,
    /// More documents matched than were returned.
    pub more: bool,
}

impl SearchResponse {
    pub fn empty() -> SearchResponse {
        SearchResponse {
            results: Vec::new(),
            more: false,
        }
    }
}

/// Runs queries end to end: parse, resolve terms, combine postings lists in
/// an engine, fetch the matching documents.
pub struct SearchService {
    config: Arc<SearchConfig>,
    store: Arc<dyn KvStore>,
    terms: TermResolver,
    documents: PackedIndexReader<u32>,
    engines: EnginePool,
    host: Arc<dyn EngineHost>,
}

impl SearchService {
    /// Validates `config` against itself and against `engines`, then wires
    /// the readers over `store`.
    ///
    /// # Errors
    ///
    /// Fails when any pooled engine's input slot cannot hold a request with
    /// `max_query_terms` terms.
    pub fn new(
        config: SearchConfig,
        store: Arc<dyn KvStore>,
        engines: EnginePool,
    ) -> Result<SearchService> {
        config.validate()?;
        let needed = request_size(config.max_query_terms);
        if engines.input_capacity() < needed {
            return Err(Error::invalid_arg(
                "engines",
                format!(
                    "input slot of {} bytes cannot hold {} terms ({needed} bytes)",
                    engines.input_capacity(),
                    config.max_query_terms
                ),
            ));
        }
        let collation: Arc<dyn Collation> = Arc::from(config.collation.create());
        log::info!(
            "Search service over {} documents, {} collation, {} engines",
            config.document_count,
            collation.name(),
            engines.size()
        );
        let terms = TermResolver::new(
            store.clone(),
            &config.popular_terms,
            Arc::new(config.normal_terms.clone()),
            collation.clone(),
        );
        let documents = PackedIndexReader::new(
            store.clone(),
            keys::DOCUMENTS_PREFIX,
            Arc::new(config.documents.clone()),
            collation,
        );
        Ok(SearchService {
            config: Arc::new(config),
            store,
            terms,
            documents,
            engines,
            host: Arc::new(DiagnosticHost),
        })
    }

    /// Replaces the receiver of engine diagnostics.
    pub fn with_host(mut self, host: Arc<dyn EngineHost>) -> SearchService {
        self.host = host;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Executes `query`, the raw query string including its leading `?`.
    pub async fn search(&self, query: &str) -> Result<SearchResponse> {
        if query.len() > self.config.max_query_bytes {
            return Err(Error::query_too_long(
                query.len(),
                self.config.max_query_bytes,
            ));
        }
        let terms = parse_query(query)?;
        if terms.len() > self.config.max_query_terms {
            return Err(Error::too_many_terms(
                terms.len(),
                self.config.max_query_terms,
            ));
        }

        let resolved = self.terms.resolve(&terms).await?;
        if resolved.require.iter().any(Option::is_none) {
            log::debug!("Required term absent, no results for {query}");
            return Ok(SearchResponse::empty());
        }
        let bitmaps = ByRole {
            require: resolved.require.into_iter().flatten().collect(),
            contain: resolved.contain.into_iter().flatten().collect(),
            exclude: resolved.exclude.into_iter().flatten().collect(),
        };
        if bitmaps.is_empty() {
            return self.default_results().await;
        }

        let result = self.run_engine(&bitmaps).await?;
        let results = try_join_all(result.documents.iter().map(|&id| self.document(id))).await?;
        Ok(SearchResponse {
            results,
            more: result.more,
        })
    }

    async fn run_engine(&self, bitmaps: &ByRole<Vec<u8>>) -> Result<QueryResult> {
        let mut engine = self.engines.lease().await?;
        engine.reset();
        let request = build_query_request(&mut *engine, bitmaps)?;
        execute_query(&mut *engine, self.host.as_ref(), &request)?.ok_or_else(|| {
            log::error!(
                "Engine returned no result for {} postings lists",
                bitmaps.len()
            );
            Error::engine_failure("failed to execute query")
        })
    }

    /// The precomputed results of a query without usable terms.
    async fn default_results(&self) -> Result<SearchResponse> {
        let value = self
            .store
            .get_json(keys::DEFAULT_RESULTS)
            .await?
            .ok_or_else(|| {
                log::error!("Default results are missing from the store");
                Error::lookup_inconsistency("missing default results")
            })?;
        match value {
            serde_json::Value::Array(results) => Ok(SearchResponse {
                results,
                more: true,
            }),
            other => Err(Error::invalid_format(
                keys::DEFAULT_RESULTS,
                format!("expected a JSON array, found {other}"),
            )),
        }
    }

    async fn document(&self, id: u32) -> Result<serde_json::Value> {
        let bytes = self.documents.get(&id).await?.ok_or_else(|| {
            log::error!("Engine returned document {id}, which is not in the document index");
            Error::lookup_inconsistency(format!("missing document {id}"))
        })?;
        match self.config.document_encoding {
            DocumentEncoding::Text => Ok(serde_json::Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            )),
            DocumentEncoding::Json => Ok(serde_json::from_slice(&bytes)?),
        }
    }
}
