use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use kvsearch_common::Result;

use crate::KvStore;

/// An in-memory store, shared by clones.
#[derive(Clone, Default)]
pub struct MemoryKvStore {
    entries: Arc<RwLock<HashMap<String, Arc<[u8]>>>>,
}

impl MemoryKvStore {
    pub fn new() -> MemoryKvStore {
        Default::default()
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        let value: Vec<u8> = value.into();
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .map(|v| v.to_vec());
        Ok(value)
    }
}
