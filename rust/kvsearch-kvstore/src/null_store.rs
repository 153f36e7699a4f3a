//! "null" store: every key is absent.

use async_trait::async_trait;
use kvsearch_common::Result;

use crate::KvStore;

/// A no-op implementation of the `KvStore` trait, useful for testing the
/// absence paths of the search pipeline.
pub struct NullKvStore;

#[async_trait]
impl KvStore for NullKvStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}
