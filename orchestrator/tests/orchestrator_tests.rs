mod common;

use std::sync::Arc;
use std::time::Duration;

use prometheus::Registry;

use common::*;
use retrieval_orchestrator::metrics::QueryMetrics;
use retrieval_orchestrator::{Backend, Modality, QueryOrchestrator, SearchError, SearchQuery};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}

#[tokio::test]
async fn test_lexical_scores_normalized_by_batch_maximum() {
    let fx = fixture();

    let scores = fx.orchestrator.lexical_search("colorectal", 10).await.unwrap();

    assert_eq!(scores.get(42), Some(1.0));
    assert_close(scores.get(7).unwrap(), 0.333);
}

#[tokio::test]
async fn test_lexical_query_end_to_end() {
    let fx = fixture();
    let query = SearchQuery::new("colorectal tumours", Modality::Lexical);

    let results = fx.orchestrator.search(&query).await.unwrap();

    assert_eq!(results.ranked.document_ids(), vec![42, 7]);
    assert_eq!(results.documents.len(), results.ranked.len());
    assert_eq!(results.documents[0].full_text, DOC_42);
    assert_eq!(results.documents[1].full_text, DOC_7);
    assert_eq!(fx.vector.search_calls(), 0);
    assert_eq!(fx.embedder.calls(), 0);
}

#[tokio::test]
async fn test_semantic_passages_aggregate_per_document() {
    let fx = fixture();

    let scores = fx.orchestrator.semantic_search("colorectal", 10).await.unwrap();

    assert_eq!(scores.len(), 2);
    assert_eq!(scores.get(42), Some(1.5));
    assert_eq!(scores.get(7), Some(1.0));
}

#[tokio::test]
async fn test_semantic_query_embeds_raw_text() {
    let fx = fixture();
    let raw = "What is the role of TP53 in apoptosis?";
    let query = SearchQuery::new(raw, Modality::Semantic);

    let results = fx.orchestrator.search(&query).await.unwrap();

    assert_eq!(fx.embedder.last_text().as_deref(), Some(raw));
    assert_eq!(fx.lexical.search_calls(), 0);
    assert_eq!(results.ranked.document_ids(), vec![42, 7]);
    assert_close(results.ranked.0[0].score, 1.5);
}

#[tokio::test]
async fn test_hybrid_fusion_scores_and_order() {
    let fx = fixture();
    let query = SearchQuery::new("colorectal tumours", Modality::Hybrid).with_weights(0.4, 0.5);

    let results = fx.orchestrator.search(&query).await.unwrap();

    assert_eq!(results.ranked.document_ids(), vec![42, 7]);
    assert_close(results.ranked.0[0].score, 1.15);
    assert_close(results.ranked.0[1].score, 0.633);
    assert_eq!(results.documents[0].document_id, 42);
}

#[tokio::test]
async fn test_hybrid_sends_filtered_text_to_lexical_and_raw_text_to_embedder() {
    let fx = fixture();
    let raw = "What is the role of TP53 in apoptosis?";
    let query = SearchQuery::new(raw, Modality::Hybrid);

    fx.orchestrator.execute(&query).await.unwrap();

    assert_eq!(fx.lexical.last_query_text().as_deref(), Some("role TP53 apoptosis ?"));
    assert_eq!(fx.embedder.last_text().as_deref(), Some(raw));
}

#[tokio::test]
async fn test_stopword_filtering_can_be_disabled() {
    let fx = fixture();
    let raw = "the role of TP53";
    let query = SearchQuery::new(raw, Modality::Lexical).with_stopwords(false);

    fx.orchestrator.execute(&query).await.unwrap();

    assert_eq!(fx.lexical.last_query_text().as_deref(), Some(raw));
}

#[tokio::test]
async fn test_invalid_weights_rejected_before_backend_calls() {
    let fx = fixture();
    let query = SearchQuery::new("colorectal", Modality::Hybrid).with_weights(0.7, 0.4);

    let err = fx.orchestrator.search(&query).await.unwrap_err();

    assert!(matches!(err, SearchError::InvalidWeights { .. }));
    assert_eq!(fx.lexical.search_calls(), 0);
    assert_eq!(fx.vector.search_calls(), 0);
    assert_eq!(fx.embedder.calls(), 0);
    assert_eq!(fx.lexical.lookups.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_weights_rejected_without_backends() {
    let unwired = QueryOrchestrator::new(test_config());
    let query = SearchQuery::new("colorectal", Modality::Hybrid).with_weights(0.7, 0.4);

    assert!(matches!(
        unwired.search(&query).await,
        Err(SearchError::InvalidWeights { .. })
    ));

    let lexical_only =
        QueryOrchestrator::new(test_config()).with_lexical_backend(Arc::new(lexical_corpus()));
    assert!(matches!(
        lexical_only.search(&query).await,
        Err(SearchError::InvalidWeights { .. })
    ));
}

#[tokio::test]
async fn test_zero_limit_rejected() {
    let fx = fixture();
    let query = SearchQuery::new("colorectal", Modality::Lexical).with_limit(0);

    assert!(matches!(
        fx.orchestrator.search(&query).await,
        Err(SearchError::InvalidLimit(0))
    ));
    assert_eq!(fx.lexical.search_calls(), 0);
}

#[tokio::test]
async fn test_hybrid_ranking_keeps_one_extra_result() {
    let lexical = MockLexical::new(&[(1, 9.0), (2, 8.0), (3, 7.0)])
        .with_document(1, "one")
        .with_document(2, "two")
        .with_document(3, "three")
        .with_document(4, "four");
    let vector = MockVector::new(&[(10, 3, 0.9), (11, 4, 0.8), (12, 5, 0.7)]);
    let fx = fixture_with(lexical, vector);

    let hybrid = SearchQuery::new("q", Modality::Hybrid).with_limit(2);
    let results = fx.orchestrator.search(&hybrid).await.unwrap();
    assert_eq!(results.ranked.document_ids(), vec![1, 3, 4]);
    assert_eq!(results.documents.len(), 3);

    let lexical_only = SearchQuery::new("q", Modality::Lexical).with_limit(2);
    let results = fx.orchestrator.search(&lexical_only).await.unwrap();
    assert_eq!(results.ranked.len(), 2);
}

#[tokio::test]
async fn test_hybrid_accepts_maximum_limit() {
    let fx = fixture();
    let query = SearchQuery::new("colorectal", Modality::Hybrid).with_limit(usize::MAX);

    let results = fx.orchestrator.search(&query).await.unwrap();

    assert_eq!(results.ranked.document_ids(), vec![42, 7]);
    assert_eq!(results.documents.len(), 2);
}

#[tokio::test]
async fn test_hydration_keeps_ranked_order_when_lookups_finish_out_of_order() {
    let lexical = MockLexical::new(&[(1, 9.0), (2, 8.0), (3, 7.0)])
        .with_document(1, "one")
        .with_document(2, "two")
        .with_document(3, "three")
        .with_lookup_delay(1, Duration::from_millis(120))
        .with_lookup_delay(2, Duration::from_millis(60));
    let fx = fixture_with(lexical, MockVector::new(&[]));
    let query = SearchQuery::new("q", Modality::Lexical);

    let results = fx.orchestrator.search(&query).await.unwrap();

    assert_eq!(results.ranked.document_ids(), vec![1, 2, 3]);
    let hydrated: Vec<_> = results.documents.iter().map(|d| d.document_id).collect();
    assert_eq!(hydrated, results.ranked.document_ids());
    let texts: Vec<_> = results.documents.iter().map(|d| d.full_text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn test_missing_document_fails_hydration() {
    let lexical = MockLexical::new(&[(42, 9.0), (99, 5.0)]).with_document(42, DOC_42);
    let fx = fixture_with(lexical, vector_corpus());
    let query = SearchQuery::new("colorectal", Modality::Lexical);

    assert!(matches!(
        fx.orchestrator.execute(&query).await,
        Err(SearchError::DocumentNotFound(99))
    ));
}

#[tokio::test]
async fn test_hydrate_single_document() {
    let fx = fixture();

    let document = fx.orchestrator.hydrate_document(13).await.unwrap();
    assert_eq!(document.full_text, DOC_13);

    assert!(matches!(
        fx.orchestrator.hydrate_document(404).await,
        Err(SearchError::DocumentNotFound(404))
    ));
}

#[tokio::test]
async fn test_rescore_flag_reaches_vector_engine() {
    let fx = fixture();
    let query = SearchQuery::new("colorectal", Modality::Semantic);

    assert!(fx.orchestrator.settings().await.rescore);
    fx.orchestrator.execute(&query).await.unwrap();
    assert_eq!(fx.vector.last_rescore(), Some(true));

    fx.orchestrator.set_rescore(false).await;
    fx.orchestrator.execute(&query).await.unwrap();
    assert_eq!(fx.vector.last_rescore(), Some(false));
    assert!(!fx.orchestrator.settings().await.rescore);
}

#[tokio::test]
async fn test_unconfigured_backends() {
    let lexical_only =
        QueryOrchestrator::new(test_config()).with_lexical_backend(Arc::new(lexical_corpus()));
    let semantic = SearchQuery::new("colorectal", Modality::Semantic);
    assert!(matches!(
        lexical_only.search(&semantic).await,
        Err(SearchError::BackendNotConfigured(Backend::Vector))
    ));

    let vector = Arc::new(vector_corpus());
    let no_lexical = QueryOrchestrator::new(test_config())
        .with_vector_backend(vector.clone())
        .with_embedder(Arc::new(MockEmbedder::default()));
    assert!(matches!(
        no_lexical.search(&semantic).await,
        Err(SearchError::BackendNotConfigured(Backend::Lexical))
    ));
    assert_eq!(vector.search_calls(), 0);
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let lexical = lexical_corpus().with_delay(Duration::from_secs(2));
    let fx = fixture_with(lexical, vector_corpus());
    let query = SearchQuery::new("colorectal", Modality::Lexical);

    assert!(matches!(
        fx.orchestrator.search(&query).await,
        Err(SearchError::BackendTimeout {
            backend: Backend::Lexical,
            timeout_ms: 200
        })
    ));
}

#[tokio::test]
async fn test_hybrid_aborts_when_one_modality_fails() {
    let fx = fixture_with(lexical_corpus(), MockVector::failing());
    let query = SearchQuery::new("colorectal", Modality::Hybrid);

    let err = fx.orchestrator.search(&query).await.unwrap_err();

    assert!(matches!(
        err,
        SearchError::BackendUnavailable {
            backend: Backend::Vector,
            ..
        }
    ));
    assert!(err.is_transient());
    assert_eq!(fx.lexical.lookups.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_results_hydrate_nothing() {
    let fx = fixture_with(MockLexical::new(&[]), MockVector::new(&[]));

    for modality in [Modality::Lexical, Modality::Semantic, Modality::Hybrid] {
        let results = fx
            .orchestrator
            .search(&SearchQuery::new("nothing matches", modality))
            .await
            .unwrap();
        assert!(results.ranked.is_empty());
        assert!(results.documents.is_empty());
    }
}

#[tokio::test]
async fn test_query_outcomes_are_counted() {
    let registry = Registry::new();
    let orchestrator = QueryOrchestrator::new(test_config())
        .with_lexical_backend(Arc::new(lexical_corpus()))
        .with_metrics(QueryMetrics::register(&registry).unwrap());

    orchestrator
        .search(&SearchQuery::new("colorectal", Modality::Lexical))
        .await
        .unwrap();
    orchestrator
        .search(&SearchQuery::new("colorectal", Modality::Semantic))
        .await
        .unwrap_err();

    let families = registry.gather();
    let queries = families
        .iter()
        .find(|family| family.get_name() == "retrieval_queries_total")
        .unwrap();
    let total: f64 = queries
        .get_metric()
        .iter()
        .map(|metric| metric.get_counter().get_value())
        .sum();
    assert_eq!(total, 2.0);

    let backend_errors = families
        .iter()
        .find(|family| family.get_name() == "retrieval_backend_errors_total")
        .unwrap();
    assert_eq!(backend_errors.get_metric().len(), 1);
}
