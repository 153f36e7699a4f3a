use std::{collections::HashMap, sync::Arc};

use futures::future::try_join_all;
use kvsearch_common::{Result, error::Error};
use kvsearch_engine::ByRole;
use kvsearch_kvstore::{KvStore, keys};
use kvsearch_packed_index::{Collation, LookupTable, PackedIndexReader};

use crate::config::PopularTerm;

/// Maps terms to their serialized postings lists.
///
/// Popular terms are sliced out of a shared blob by the byte range listed in
/// the configuration; all other terms go through the packed normal-terms
/// index.
pub struct TermResolver {
    store: Arc<dyn KvStore>,
    popular: HashMap<String, PopularTerm>,
    normal: PackedIndexReader<String>,
}

impl TermResolver {
    pub fn new(
        store: Arc<dyn KvStore>,
        popular_terms: &[PopularTerm],
        normal_terms: Arc<LookupTable<String>>,
        collation: Arc<dyn Collation>,
    ) -> TermResolver {
        let popular = popular_terms
            .iter()
            .map(|p| (p.term.clone(), p.clone()))
            .collect();
        let normal = PackedIndexReader::new(
            store.clone(),
            keys::NORMAL_TERMS_PREFIX,
            normal_terms,
            collation,
        );
        TermResolver {
            store,
            popular,
            normal,
        }
    }

    pub fn is_popular(&self, term: &str) -> bool {
        self.popular.contains_key(term)
    }

    /// Returns the postings list of `term`, or `None` when no document has it.
    pub async fn resolve_term(&self, term: &str) -> Result<Option<Vec<u8>>> {
        match self.popular.get(term) {
            Some(popular) => self.read_popular(popular).await.map(Some),
            None => self.normal.get(&term.to_string()).await,
        }
    }

    /// Resolves every term of every role concurrently.
    pub async fn resolve(&self, terms: &ByRole<String>) -> Result<ByRole<Option<Vec<u8>>>> {
        let resolved = try_join_all(terms.iter().map(|(role, term)| async move {
            let bitmap = self.resolve_term(term).await?;
            log::debug!(
                "{} term \"{term}\" ({}): {}",
                role.name(),
                if self.is_popular(term) { "popular" } else { "normal" },
                bitmap
                    .as_ref()
                    .map_or("absent".to_string(), |b| format!("{} bytes", b.len()))
            );
            Ok::<_, Error>((role, bitmap))
        }))
        .await?;
        Ok(resolved.into_iter().collect())
    }

    async fn read_popular(&self, popular: &PopularTerm) -> Result<Vec<u8>> {
        let blob_key = keys::popular_terms(popular.blob_id);
        let blob = self.store.get(&blob_key).await?.ok_or_else(|| {
            log::error!("Popular terms blob {blob_key} is missing from the store");
            Error::lookup_inconsistency(format!("missing package {blob_key}"))
        })?;
        let start = popular.offset as usize;
        let end = start + popular.length as usize;
        blob.get(start..end).map(<[u8]>::to_vec).ok_or_else(|| {
            log::error!(
                "Popular term \"{}\" range {start}..{end} exceeds {blob_key} ({} bytes)",
                popular.term,
                blob.len()
            );
            Error::lookup_inconsistency(format!(
                "popular term \"{}\" out of range of {blob_key}",
                popular.term
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kvsearch_common::ErrorKind;
    use kvsearch_engine::{ByRole, Role};
    use kvsearch_kvstore::{KvStore, keys};
    use kvsearch_packed_index::CollationKind;
    use kvsearch_testkit::{foo_bar_corpus, postings};

    use super::TermResolver;
    use crate::config::SearchConfig;

    fn resolver(popular_threshold: usize) -> (TermResolver, kvsearch_kvstore::MemoryKvStore) {
        let corpus = foo_bar_corpus().popular_threshold(popular_threshold).build();
        let config = SearchConfig::from_value(corpus.config).unwrap();
        let store: Arc<dyn KvStore> = Arc::new(corpus.store.clone());
        let resolver = TermResolver::new(
            store,
            &config.popular_terms,
            Arc::new(config.normal_terms),
            Arc::from(CollationKind::Binary.create()),
        );
        (resolver, corpus.store)
    }

    #[tokio::test]
    async fn test_normal_and_popular_paths_agree() {
        let (normal_only, _) = resolver(usize::MAX);
        let (with_popular, _) = resolver(3);
        assert!(!normal_only.is_popular("foo"));
        assert!(with_popular.is_popular("foo"));
        assert!(!with_popular.is_popular("baz"));

        for term in ["foo", "bar", "baz"] {
            assert_eq!(
                normal_only.resolve_term(term).await.unwrap(),
                with_popular.resolve_term(term).await.unwrap(),
                "{term}"
            );
        }
        assert_eq!(
            with_popular.resolve_term("foo").await.unwrap(),
            Some(postings::from_ids([1, 2, 3]))
        );
    }

    #[tokio::test]
    async fn test_absent_terms() {
        let (resolver, _) = resolver(3);
        assert_eq!(resolver.resolve_term("aardvark").await.unwrap(), None);
        assert_eq!(resolver.resolve_term("zzz").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_keeps_roles_and_order() {
        let (resolver, _) = resolver(3);
        let mut terms = ByRole::new();
        terms.push(Role::Contain, "bar".to_string());
        terms.push(Role::Contain, "nope".to_string());
        terms.push(Role::Require, "foo".to_string());
        let resolved = resolver.resolve(&terms).await.unwrap();
        assert_eq!(resolved.require, vec![Some(postings::from_ids([1, 2, 3]))]);
        assert_eq!(
            resolved.contain,
            vec![Some(postings::from_ids([2, 3, 4])), None]
        );
        assert!(resolved.exclude.is_empty());
    }

    #[tokio::test]
    async fn test_missing_popular_blob() {
        let (resolver, store) = resolver(3);
        store.remove(&keys::popular_terms(0));
        let err = resolver.resolve_term("foo").await.unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::LookupInconsistency { .. }
        ));
    }
}
