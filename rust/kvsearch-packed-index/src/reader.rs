use std::sync::Arc;

use kvsearch_common::{Result, error::Error};
use kvsearch_kvstore::KvStore;

use crate::{bst, collation::Collation, key::PackedKey, lookup_table::LookupTable};

/// Point lookups against one packed key namespace of the store.
///
/// A lookup first locates the covering package in the in-memory
/// [`LookupTable`], fetches the package blob (`<prefix><blob_id>`), then
/// descends the BST inside it from the entry's anchor.
pub struct PackedIndexReader<K> {
    store: Arc<dyn KvStore>,
    key_prefix: String,
    table: Arc<LookupTable<K>>,
    collation: Arc<dyn Collation>,
}

impl<K: PackedKey> PackedIndexReader<K> {
    pub fn new(
        store: Arc<dyn KvStore>,
        key_prefix: impl Into<String>,
        table: Arc<LookupTable<K>>,
        collation: Arc<dyn Collation>,
    ) -> PackedIndexReader<K> {
        PackedIndexReader {
            store,
            key_prefix: key_prefix.into(),
            table,
            collation,
        }
    }

    pub fn table(&self) -> &LookupTable<K> {
        &self.table
    }

    /// Returns the value stored under `key`, or `None` when the key is not
    /// in the index.
    ///
    /// # Errors
    ///
    /// Store failures propagate. A package listed in the table but missing
    /// from the store, or a malformed package, is reported as corrupt build
    /// output.
    pub async fn get(&self, key: &K) -> Result<Option<Vec<u8>>> {
        let Some(entry) = self.table.locate(key, self.collation.as_ref())? else {
            return Ok(None);
        };
        let blob_key = format!("{}{}", self.key_prefix, entry.blob_id);
        let blob = self.store.get(&blob_key).await?.ok_or_else(|| {
            log::error!("Package {blob_key} listed in the lookup table is missing from the store");
            Error::lookup_inconsistency(format!("missing package {blob_key}"))
        })?;

        let value = bst::find(&blob, entry.anchor as usize, key, self.collation.as_ref())?;
        log::debug!(
            "Lookup of {key} in {blob_key}: {}",
            if value.is_some() { "hit" } else { "miss" }
        );
        Ok(value.map(<[u8]>::to_vec))
    }
}
