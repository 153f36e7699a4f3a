use std::sync::Arc;

use kvsearch_common::ErrorKind;
use kvsearch_kvstore::{KvStore, MemoryKvStore};
use kvsearch_packed_index::{
    CollationKind, LookupEntry, LookupTable, PackedIndexReader, PackedKey,
};
use kvsearch_testkit::packer::{PackageEntry, PackedKeyBytes, pack_packages};

fn load<K>(
    store: &MemoryKvStore,
    prefix: &str,
    entries: &[(PackedKeyBytes, Vec<u8>)],
    per_package: usize,
    key: impl Fn(&PackageEntry) -> K,
) -> PackedIndexReader<K>
where
    K: PackedKey,
{
    let (blobs, packages) = pack_packages(entries, per_package);
    for (blob_id, blob) in blobs.into_iter().enumerate() {
        store.insert(format!("{prefix}{blob_id}"), blob);
    }
    let table = LookupTable::new(
        packages
            .iter()
            .map(|p| LookupEntry::new(key(p), p.blob_id, p.root))
            .collect(),
    );
    let shared: Arc<dyn KvStore> = Arc::new(store.clone());
    PackedIndexReader::new(
        shared,
        prefix,
        Arc::new(table),
        Arc::from(CollationKind::Binary.create()),
    )
}

fn document_reader(store: &MemoryKvStore, ids: &[u32], per_package: usize) -> PackedIndexReader<u32> {
    let entries = ids
        .iter()
        .map(|&id| (PackedKeyBytes::U32(id), format!("doc {id}").into_bytes()))
        .collect::<Vec<_>>();
    load(store, "doc_", &entries, per_package, |p| match p.key {
        PackedKeyBytes::U32(id) => id,
        PackedKeyBytes::Text(_) => unreachable!(),
    })
}

#[tokio::test]
async fn test_every_document_across_packages() {
    let store = MemoryKvStore::new();
    let ids = (0..200u32).map(|i| i * 3 + 1).collect::<Vec<_>>();
    let reader = document_reader(&store, &ids, 7);
    assert_eq!(reader.table().len(), 29);

    for &id in &ids {
        assert_eq!(
            reader.get(&id).await.unwrap(),
            Some(format!("doc {id}").into_bytes())
        );
    }
    for missing in [0, 2, 3, 301, 599, 10_000] {
        assert_eq!(reader.get(&missing).await.unwrap(), None, "{missing}");
    }
}

#[tokio::test]
async fn test_text_keys_with_random_sizes() {
    fastrand::seed(7);
    for round in 0..20 {
        let store = MemoryKvStore::new();
        let mut terms = (0..fastrand::usize(1..150))
            .map(|_| {
                (0..fastrand::usize(1..12))
                    .map(|_| fastrand::lowercase())
                    .collect::<String>()
            })
            .collect::<Vec<_>>();
        terms.sort();
        terms.dedup();
        let entries = terms
            .iter()
            .map(|t| (PackedKeyBytes::Text(t.clone()), t.to_uppercase().into_bytes()))
            .collect::<Vec<_>>();
        let reader = load(&store, "normal_terms_", &entries, fastrand::usize(1..10), |p| {
            match &p.key {
                PackedKeyBytes::Text(t) => t.clone(),
                PackedKeyBytes::U32(_) => unreachable!(),
            }
        });

        for term in &terms {
            assert_eq!(
                reader.get(term).await.unwrap(),
                Some(term.to_uppercase().into_bytes()),
                "round {round}: {term}"
            );
        }
        let absent = format!("{}0", terms[0]);
        if !terms.contains(&absent) {
            assert_eq!(reader.get(&absent).await.unwrap(), None);
        }
    }
}

#[tokio::test]
async fn test_missing_package_is_inconsistency() {
    let store = MemoryKvStore::new();
    let reader = document_reader(&store, &[1, 2, 3, 4, 5, 6], 2);
    assert!(store.remove("doc_1"));

    assert!(reader.get(&1).await.unwrap().is_some());
    let err = reader.get(&3).await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::LookupInconsistency { .. }));
}

#[tokio::test]
async fn test_empty_table_finds_nothing() {
    let store = MemoryKvStore::new();
    let reader = document_reader(&store, &[], 4);
    assert!(reader.table().is_empty());
    assert_eq!(reader.get(&0).await.unwrap(), None);
    assert!(store.is_empty());
}
