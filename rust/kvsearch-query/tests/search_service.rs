use std::sync::{Arc, Mutex};

use kvsearch_common::{Error, ErrorKind, Result};
use kvsearch_engine::{
    DiagnosticHost, EngineHost, EnginePool, NativeEngine, NativeEngineOptions, QueryEngine,
};
use kvsearch_kvstore::{KvStore, keys};
use kvsearch_query::{SearchConfig, SearchResponse, SearchService};
use kvsearch_testkit::{CorpusBuilder, FixtureEncoding, PackedCorpus, foo_bar_corpus};
use serde_json::json;

fn service(corpus: PackedCorpus) -> SearchService {
    let config = SearchConfig::from_value(corpus.config).unwrap();
    let options = config.engine_options(1 << 20);
    let engines = EnginePool::with_factory(2, || {
        Ok(Box::new(NativeEngine::new(options.clone())?) as Box<dyn QueryEngine>)
    })
    .unwrap();
    let store: Arc<dyn KvStore> = Arc::new(corpus.store);
    SearchService::new(config, store, engines).unwrap()
}

fn ok(results: serde_json::Value, more: bool) -> SearchResponse {
    SearchResponse {
        results: results.as_array().unwrap().clone(),
        more,
    }
}

#[tokio::test]
async fn test_require_intersection() {
    let service = service(foo_bar_corpus().build());
    assert_eq!(
        service.search("?q=0_foo&0_bar").await.unwrap(),
        ok(json!(["two", "three"]), false)
    );
}

#[tokio::test]
async fn test_same_results_through_popular_table() {
    let normal = service(foo_bar_corpus().build());
    let popular = service(foo_bar_corpus().popular_threshold(3).build());
    for query in ["?q=0_foo&0_bar", "?q=1_foo&2_bar", "?q=1_baz&1_bar", "?q=2_foo"] {
        assert_eq!(
            normal.search(query).await.unwrap(),
            popular.search(query).await.unwrap(),
            "{query}"
        );
    }
}

#[tokio::test]
async fn test_contain_and_exclude() {
    let service = service(foo_bar_corpus().build());
    assert_eq!(
        service.search("?q=1_foo&1_baz&2_bar").await.unwrap(),
        ok(json!(["zero", "one"]), false)
    );
}

#[tokio::test]
async fn test_exclude_only() {
    let service = service(foo_bar_corpus().build());
    assert_eq!(
        service.search("?q=2_foo").await.unwrap(),
        ok(json!(["zero", "four"]), false)
    );
}

#[tokio::test]
async fn test_absent_required_term_means_no_results() {
    let service = service(foo_bar_corpus().build());
    assert_eq!(
        service.search("?q=0_foo&0_unicorn&1_bar").await.unwrap(),
        SearchResponse::empty()
    );
}

#[tokio::test]
async fn test_absent_optional_terms_are_dropped() {
    let service = service(foo_bar_corpus().build());
    assert_eq!(
        service.search("?q=0_bar&1_unicorn&2_unicorn").await.unwrap(),
        ok(json!(["two", "three", "four"]), false)
    );
}

#[tokio::test]
async fn test_default_results() {
    let service = service(
        foo_bar_corpus()
            .default_results(r#"["featured"]"#)
            .build(),
    );
    let expected = ok(json!(["featured"]), true);
    assert_eq!(service.search("?q=").await.unwrap(), expected);
    assert_eq!(service.search("?q=2_unicorn").await.unwrap(), expected);
    assert_eq!(service.search("?q=1_a&2_b").await.unwrap(), expected);
}

#[tokio::test]
async fn test_result_limit_sets_more() {
    let mut corpus = CorpusBuilder::new().max_query_results(2);
    for id in 0..5 {
        corpus = corpus.document(id, format!("doc {id}"), &["common"]);
    }
    let service = service(corpus.build());
    assert_eq!(
        service.search("?q=0_common").await.unwrap(),
        ok(json!(["doc 0", "doc 1"]), true)
    );
}

#[tokio::test]
async fn test_json_documents() {
    let service = service(
        CorpusBuilder::new()
            .encoding(FixtureEncoding::Json)
            .document(0, r#"{"title":"Rust"}"#, &["systems"])
            .document(1, r#"{"title":"Go"}"#, &["systems", "gc"])
            .document(2, r#"[1, 2]"#, &["gc"])
            .build(),
    );
    assert_eq!(
        service.search("?q=0_gc").await.unwrap(),
        ok(json!([{"title": "Go"}, [1, 2]]), false)
    );
}

#[tokio::test]
async fn test_invalid_utf8_text_is_replaced() {
    let service = service(
        CorpusBuilder::new()
            .document_bytes(0, b"caf\xc3".to_vec(), &["coffee"])
            .document_bytes(1, vec![b'o', b'k', 0xff], &["coffee"])
            .build(),
    );
    assert_eq!(
        service.search("?q=0_coffee").await.unwrap(),
        ok(json!(["caf\u{fffd}", "ok\u{fffd}"]), false)
    );
}

#[tokio::test]
async fn test_many_packages() {
    let mut corpus = CorpusBuilder::new()
        .terms_per_package(2)
        .documents_per_package(2);
    for id in 0..40u32 {
        let parity = if id % 2 == 0 { "even" } else { "odd" };
        let tens = format!("tens{}", id / 10);
        let unique = format!("id{id:02}");
        corpus = corpus.document(id, format!("#{id}"), &[parity, tens.as_str(), unique.as_str()]);
    }
    let service = service(corpus.build());
    assert_eq!(
        service.search("?q=0_odd&0_tens2").await.unwrap(),
        ok(json!(["#21", "#23", "#25", "#27", "#29"]), false)
    );
    assert_eq!(
        service.search("?q=1_id07&1_id33&1_id39").await.unwrap(),
        ok(json!(["#7", "#33", "#39"]), false)
    );
}

#[tokio::test]
async fn test_client_errors() {
    let service = service(foo_bar_corpus().max_query_terms(2).build());

    let err = service.search("q=0_foo").await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MalformedQuery { .. }));
    assert!(err.is_client_error());

    let err = service.search("?q=0_a&0_b&0_c").await.unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::TooManyTerms { count: 3, max: 2 }
    ));

    let long = format!("?q=0_{}", "x".repeat(600));
    let err = service.search(&long).await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::QueryTooLong { .. }));
}

#[tokio::test]
async fn test_missing_document_is_inconsistency() {
    let corpus = foo_bar_corpus().documents_per_package(10).build();
    corpus.store.remove(&keys::documents(0));
    let service = service(corpus);
    let err = service.search("?q=0_foo").await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::LookupInconsistency { .. }));
    assert!(!err.is_client_error());
}

#[test]
fn test_pool_must_fit_max_query_terms() {
    let corpus = foo_bar_corpus().max_query_terms(8).build();
    let config = SearchConfig::from_value(corpus.config).unwrap();
    let narrow = NativeEngineOptions {
        max_query_terms: 7,
        ..config.engine_options(1 << 20)
    };
    let engines = EnginePool::with_factory(2, || {
        Ok(Box::new(NativeEngine::new(narrow.clone())?) as Box<dyn QueryEngine>)
    })
    .unwrap();
    let store: Arc<dyn KvStore> = Arc::new(corpus.store);
    let err = SearchService::new(config, store, engines)
        .err()
        .expect("undersized engines are rejected");
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { name, .. } if name == "engines"));
}

/// Forwards to the logging host and counts informational lines.
#[derive(Default)]
struct CountingHost {
    info: Mutex<Vec<String>>,
}

impl EngineHost for CountingHost {
    fn log_info(&self, memory: &[u8], args: u32) -> Result<()> {
        self.info
            .lock()
            .unwrap()
            .push(DiagnosticHost::format(memory, args)?);
        Ok(())
    }

    fn log_fatal(&self, memory: &[u8], args: u32) -> Error {
        DiagnosticHost.log_fatal(memory, args)
    }
}

#[tokio::test]
async fn test_engine_diagnostics_reach_host() {
    let host = Arc::new(CountingHost::default());
    let service = service(foo_bar_corpus().build()).with_host(host.clone());
    service.search("?q=0_foo&2_bar").await.unwrap();
    // Short-circuited queries never reach the engine.
    service.search("?q=0_unicorn").await.unwrap();
    assert_eq!(
        host.info.lock().unwrap().as_slice(),
        &["run_query: require=1 contain=0 exclude=1 matched=1 returned=1".to_string()]
    );
}
