//! Fixture corpora: a handful of documents with their terms, packed the way the
//! index build lays them out, loaded into a [`MemoryKvStore`].

use std::collections::BTreeMap;

use kvsearch_kvstore::{MemoryKvStore, keys};
use roaring::RoaringBitmap;

use crate::packer::{PackedKeyBytes, pack_packages};

/// How documents are stored and returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureEncoding {
    /// Payloads are plain text, returned as JSON strings.
    Text,
    /// Payloads are JSON documents, returned as parsed values.
    Json,
}

impl FixtureEncoding {
    fn name(&self) -> &'static str {
        match self {
            FixtureEncoding::Text => "text",
            FixtureEncoding::Json => "json",
        }
    }
}

/// Builder for a packed fixture corpus.
#[derive(Debug)]
pub struct CorpusBuilder {
    documents: Vec<(u32, Vec<u8>)>,
    postings: BTreeMap<String, RoaringBitmap>,
    encoding: FixtureEncoding,
    popular_threshold: usize,
    terms_per_package: usize,
    documents_per_package: usize,
    max_query_terms: usize,
    max_query_results: usize,
    default_results: Option<String>,
}

impl Default for CorpusBuilder {
    fn default() -> Self {
        CorpusBuilder {
            documents: Vec::new(),
            postings: BTreeMap::new(),
            encoding: FixtureEncoding::Text,
            popular_threshold: usize::MAX,
            terms_per_package: 3,
            documents_per_package: 3,
            max_query_terms: 50,
            max_query_results: 50,
            default_results: None,
        }
    }
}

/// Output of [`CorpusBuilder::build`].
#[derive(Clone)]
pub struct PackedCorpus {
    pub store: MemoryKvStore,
    /// Service configuration in its JSON form.
    pub config: serde_json::Value,
}

impl CorpusBuilder {
    pub fn new() -> CorpusBuilder {
        Default::default()
    }

    pub fn encoding(mut self, encoding: FixtureEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Terms contained in at least `threshold` documents go to the popular table.
    pub fn popular_threshold(mut self, threshold: usize) -> Self {
        self.popular_threshold = threshold;
        self
    }

    pub fn terms_per_package(mut self, count: usize) -> Self {
        self.terms_per_package = count;
        self
    }

    pub fn documents_per_package(mut self, count: usize) -> Self {
        self.documents_per_package = count;
        self
    }

    pub fn max_query_terms(mut self, count: usize) -> Self {
        self.max_query_terms = count;
        self
    }

    pub fn max_query_results(mut self, count: usize) -> Self {
        self.max_query_results = count;
        self
    }

    /// Raw JSON array stored under the `default` key.
    pub fn default_results(mut self, json: impl Into<String>) -> Self {
        self.default_results = Some(json.into());
        self
    }

    /// Adds a document with an explicit id.
    pub fn document(self, id: u32, payload: impl Into<String>, terms: &[&str]) -> Self {
        self.document_bytes(id, payload.into().into_bytes(), terms)
    }

    /// Adds a document whose payload need not be valid UTF-8.
    pub fn document_bytes(mut self, id: u32, payload: Vec<u8>, terms: &[&str]) -> Self {
        self.documents.push((id, payload));
        for term in terms {
            self.postings
                .entry(term.to_string())
                .or_default()
                .insert(id);
        }
        self
    }

    pub fn build(self) -> PackedCorpus {
        let store = MemoryKvStore::new();

        let mut popular = Vec::new();
        let mut popular_blob = Vec::new();
        let mut normal = Vec::new();
        for (term, bitmap) in &self.postings {
            let serialized = crate::postings::serialize(bitmap);
            if bitmap.len() as usize >= self.popular_threshold {
                popular.push(serde_json::json!([
                    term,
                    0,
                    popular_blob.len(),
                    serialized.len()
                ]));
                popular_blob.extend_from_slice(&serialized);
            } else {
                normal.push((PackedKeyBytes::Text(term.clone()), serialized));
            }
        }
        if !popular.is_empty() {
            store.insert(keys::popular_terms(0), popular_blob);
        }

        let (blobs, normal_table) = pack_packages(&normal, self.terms_per_package);
        for (blob_id, blob) in blobs.into_iter().enumerate() {
            store.insert(keys::normal_terms(blob_id as u32), blob);
        }

        let mut documents = self
            .documents
            .iter()
            .map(|(id, payload)| (PackedKeyBytes::U32(*id), payload.clone()))
            .collect::<Vec<_>>();
        documents.sort_by(|a, b| a.0.cmp(&b.0));
        let (blobs, documents_table) = pack_packages(&documents, self.documents_per_package);
        for (blob_id, blob) in blobs.into_iter().enumerate() {
            store.insert(keys::documents(blob_id as u32), blob);
        }

        let default_results = self.default_results.unwrap_or_else(|| {
            let first = self.documents.iter().take(self.max_query_results);
            let values = first
                .map(|(_, payload)| match self.encoding {
                    FixtureEncoding::Text => {
                        serde_json::Value::from(String::from_utf8_lossy(payload).into_owned())
                    }
                    FixtureEncoding::Json => {
                        serde_json::from_slice(payload).unwrap_or(serde_json::Value::Null)
                    }
                })
                .collect::<Vec<_>>();
            serde_json::Value::Array(values).to_string()
        });
        store.insert(keys::DEFAULT_RESULTS, default_results.into_bytes());

        let document_count = self
            .documents
            .iter()
            .map(|(id, _)| id + 1)
            .max()
            .unwrap_or(0);

        let config = serde_json::json!({
            "max_query_bytes": 512,
            "max_query_terms": self.max_query_terms,
            "max_query_results": self.max_query_results,
            "document_count": document_count,
            "document_encoding": self.encoding.name(),
            "popular_terms": popular,
            "normal_terms": normal_table.iter().map(|e| e.to_json()).collect::<Vec<_>>(),
            "documents": documents_table.iter().map(|e| e.to_json()).collect::<Vec<_>>(),
        });

        PackedCorpus { store, config }
    }
}

/// The two-term corpus used throughout the service tests: "foo" is in
/// documents 1, 2 and 3, "bar" in 2, 3 and 4.
pub fn foo_bar_corpus() -> CorpusBuilder {
    CorpusBuilder::new()
        .document(0, "zero", &["baz"])
        .document(1, "one", &["foo"])
        .document(2, "two", &["foo", "bar"])
        .document(3, "three", &["foo", "bar"])
        .document(4, "four", &["bar"])
}
