//! *Key-value store* abstraction: the read-only point-lookup service that holds
//! every packed index blob, postings list package and document package.
//!
//! Keys live in a handful of namespaces (see [`keys`]). A missing key is an
//! ordinary `Ok(None)`, never an error; absence of a term or a document is
//! meaningful data for the search pipeline.

pub mod local_store;
pub mod memory_store;
pub mod null_store;

use async_trait::async_trait;
use kvsearch_common::{Result, error::Error};

pub use local_store::LocalFsKvStore;
pub use memory_store::MemoryKvStore;
pub use null_store::NullKvStore;

/// The `KvStore` trait represents the external "point lookup" storage service.
///
/// Implementations only provide raw byte access; text and JSON decoding are
/// layered on top by the provided methods.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Fetches the raw bytes stored under `key`, or `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Fetches `key` and decodes it as UTF-8 text.
    async fn get_text(&self, key: &str) -> Result<Option<String>> {
        match self.get(key).await? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| Error::store(key, e)),
            None => Ok(None),
        }
    }

    /// Fetches `key` and parses it as a JSON value.
    async fn get_json(&self, key: &str) -> Result<Option<serde_json::Value>> {
        match self.get(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| Error::store(key, e)),
            None => Ok(None),
        }
    }
}

/// Key naming for the store namespaces.
pub mod keys {
    /// Precomputed results returned when a query applies no filters.
    pub const DEFAULT_RESULTS: &str = "default";

    pub const POPULAR_TERMS_PREFIX: &str = "popular_terms_";
    pub const NORMAL_TERMS_PREFIX: &str = "normal_terms_";
    pub const DOCUMENTS_PREFIX: &str = "doc_";

    pub fn popular_terms(blob_id: u32) -> String {
        format!("{POPULAR_TERMS_PREFIX}{blob_id}")
    }

    pub fn normal_terms(blob_id: u32) -> String {
        format!("{NORMAL_TERMS_PREFIX}{blob_id}")
    }

    pub fn documents(blob_id: u32) -> String {
        format!("{DOCUMENTS_PREFIX}{blob_id}")
    }
}
