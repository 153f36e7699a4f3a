use std::sync::Arc;

use kvsearch_engine::{
    ByRole, DiagnosticHost, EnginePool, NativeEngine, NativeEngineOptions, QueryEngine, Role,
    build_query_request, execute_query,
};
use kvsearch_testkit::postings;

fn pool(size: usize) -> EnginePool {
    EnginePool::with_factory(size, || {
        let engine = NativeEngine::new(NativeEngineOptions {
            memory_size: 256 * 1024,
            max_results: 5,
            document_count: 1000,
            max_query_terms: 4,
        })?;
        Ok(Box::new(engine) as Box<dyn QueryEngine>)
    })
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_leases_get_isolated_results() {
    let pool = Arc::new(pool(2));
    let tasks = (0..16u32)
        .map(|i| {
            let pool = pool.clone();
            tokio::spawn(async move {
                let mut bitmaps = ByRole::new();
                bitmaps.push(Role::Require, postings::from_ids([i, i + 100, i + 200]));
                bitmaps.push(Role::Exclude, postings::from_ids([i + 100]));

                let mut engine = pool.lease().await.unwrap();
                engine.reset();
                let request = build_query_request(&mut *engine, &bitmaps).unwrap();
                let result = execute_query(&mut *engine, &DiagnosticHost, &request)
                    .unwrap()
                    .unwrap();
                (i, result)
            })
        })
        .collect::<Vec<_>>();

    for task in tasks {
        let (i, result) = task.await.unwrap();
        assert_eq!(result.documents, vec![i, i + 200]);
        assert!(!result.more);
    }
    assert_eq!(pool.idle(), 2);
}

#[tokio::test]
async fn test_exclude_only_query_pages_through_universe() {
    let pool = pool(1);
    let mut bitmaps = ByRole::new();
    bitmaps.push(Role::Exclude, postings::from_ids(0..3));

    let mut engine = pool.lease().await.unwrap();
    engine.reset();
    let request = build_query_request(&mut *engine, &bitmaps).unwrap();
    let result = execute_query(&mut *engine, &DiagnosticHost, &request)
        .unwrap()
        .unwrap();
    assert_eq!(result.documents, vec![3, 4, 5, 6, 7]);
    assert!(result.more);
}

#[tokio::test]
async fn test_fatal_diagnostic_carries_prefix() {
    let pool = pool(1);
    let mut bitmaps = ByRole::new();
    bitmaps.push(Role::Contain, vec![1, 2, 3, 4, 5, 6, 7, 8]);

    let mut engine = pool.lease().await.unwrap();
    engine.reset();
    let request = build_query_request(&mut *engine, &bitmaps).unwrap();
    let err = execute_query(&mut *engine, &DiagnosticHost, &request).unwrap_err();
    assert!(err.to_string().contains("[fprintf] run_query: undecodable contain bitmap #0"));
}
