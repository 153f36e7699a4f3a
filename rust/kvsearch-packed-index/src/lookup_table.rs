//! In-memory lookup table from keys to the packed blobs covering them.
//!
//! Each blob (a "package") holds a BST over a contiguous key range. The table
//! lists one entry per package, keyed by the smallest key in it and pointing at
//! the blob id and the offset of the BST root inside the blob. Entries are
//! sorted ascending by key with no duplicates.

use std::cmp::Ordering;

use kvsearch_common::{Result, error::Error};
use serde::Deserialize;

use crate::{collation::Collation, key::PackedKey};

/// One package entry. Deserializes from a `[key, blob_id, anchor]` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LookupEntry<K> {
    pub key: K,
    pub blob_id: u32,
    /// Offset of the BST root node within the blob.
    pub anchor: u32,
}

impl<K> LookupEntry<K> {
    pub fn new(key: K, blob_id: u32, anchor: u32) -> LookupEntry<K> {
        LookupEntry {
            key,
            blob_id,
            anchor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct LookupTable<K> {
    entries: Vec<LookupEntry<K>>,
}

impl<K> Default for LookupTable<K> {
    fn default() -> Self {
        LookupTable {
            entries: Vec::new(),
        }
    }
}

impl<K: PackedKey> LookupTable<K> {
    pub fn new(entries: Vec<LookupEntry<K>>) -> LookupTable<K> {
        LookupTable { entries }
    }

    pub fn entries(&self) -> &[LookupEntry<K>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks that keys are strictly ascending under `collation`.
    pub fn validate(&self, collation: &dyn Collation) -> Result<()> {
        for pair in self.entries.windows(2) {
            if pair[0].key.compare(&pair[1].key, collation) != Ordering::Less {
                return Err(Error::invalid_arg(
                    "lookup table",
                    format!(
                        "keys must be strictly ascending, found {} before {}",
                        pair[0].key, pair[1].key
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Finds the entry of the package that covers `key`.
    ///
    /// That is the entry with the greatest key not above `key`, or the first
    /// entry when `key` sorts before every entry (the BST lookup then misses).
    /// A key equal to an entry key always yields exactly that entry.
    ///
    /// Returns `None` only for an empty table.
    pub fn locate(&self, key: &K, collation: &dyn Collation) -> Result<Option<&LookupEntry<K>>> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        // Inclusive bounds; `hi` may drop below `lo` only on a corrupt table.
        let mut lo = 0isize;
        let mut hi = self.entries.len() as isize - 1;
        loop {
            let remaining = hi + 1 - lo;
            match remaining {
                ..=0 => {
                    return Err(Error::lookup_inconsistency(format!(
                        "search went out of bounds while looking for \"{key}\""
                    )));
                }
                1 => return Ok(Some(&self.entries[lo as usize])),
                2 => {
                    let upper = &self.entries[hi as usize];
                    let entry = if key.compare(&upper.key, collation) == Ordering::Less {
                        &self.entries[lo as usize]
                    } else {
                        upper
                    };
                    return Ok(Some(entry));
                }
                _ => {
                    let mid = lo + remaining / 2;
                    let entry = &self.entries[mid as usize];
                    match key.compare(&entry.key, collation) {
                        Ordering::Less => hi = mid - 1,
                        Ordering::Equal => return Ok(Some(entry)),
                        Ordering::Greater => lo = mid,
                    }
                }
            }
        }
    }
}
