#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use retrieval_orchestrator::backend::{
    Backend, Embedder, LexicalBackend, LexicalHit, LexicalHits, LexicalQuery, VectorBackend,
    VectorQuery,
};
use retrieval_orchestrator::models::PointId;
use retrieval_orchestrator::retrieval::StopWords;
use retrieval_orchestrator::{
    OrchestratorConfig, QueryOrchestrator, RawSemanticHit, Result, SearchError,
};

#[derive(Default)]
pub struct MockLexical {
    pub batch: LexicalHits,
    pub documents: HashMap<u64, String>,
    pub delay: Option<Duration>,
    pub lookup_delays: HashMap<u64, Duration>,
    pub queries: Mutex<Vec<LexicalQuery>>,
    pub lookups: AtomicUsize,
}

impl MockLexical {
    pub fn new(hits: &[(u64, f64)]) -> Self {
        let max_score = hits.iter().map(|h| h.1).reduce(f64::max);
        Self {
            batch: LexicalHits {
                max_score,
                hits: hits
                    .iter()
                    .map(|&(document_id, score)| LexicalHit { document_id, score })
                    .collect(),
            },
            ..Default::default()
        }
    }

    pub fn with_document(mut self, document_id: u64, text: &str) -> Self {
        self.documents.insert(document_id, text.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delays the lookup of one document, so lookups can finish out of order.
    pub fn with_lookup_delay(mut self, document_id: u64, delay: Duration) -> Self {
        self.lookup_delays.insert(document_id, delay);
        self
    }

    pub fn search_calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn last_query_text(&self) -> Option<String> {
        self.queries.lock().unwrap().last().map(|q| q.text.clone())
    }
}

#[async_trait]
impl LexicalBackend for MockLexical {
    async fn search(&self, query: &LexicalQuery) -> Result<LexicalHits> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut batch = self.batch.clone();
        batch.hits.truncate(query.limit);
        Ok(batch)
    }

    async fn lookup(&self, _index: &str, document_id: u64) -> Result<Option<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(&delay) = self.lookup_delays.get(&document_id) {
            tokio::time::sleep(delay).await;
        }
        Ok(self.documents.get(&document_id).cloned())
    }
}

#[derive(Default)]
pub struct MockVector {
    pub hits: Vec<RawSemanticHit>,
    pub fail: bool,
    pub queries: Mutex<Vec<VectorQuery>>,
}

impl MockVector {
    /// `(point, document, raw score)` triples, already sorted best first.
    pub fn new(hits: &[(u64, u64, f64)]) -> Self {
        Self {
            hits: hits
                .iter()
                .map(|&(point, document_id, raw_score)| RawSemanticHit {
                    internal_id: PointId::Num(point),
                    document_id,
                    raw_score,
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn search_calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn last_rescore(&self) -> Option<bool> {
        self.queries.lock().unwrap().last().map(|q| q.rescore)
    }
}

#[async_trait]
impl VectorBackend for MockVector {
    async fn search(&self, query: &VectorQuery) -> Result<Vec<RawSemanticHit>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(SearchError::unavailable(Backend::Vector, "connection refused"));
        }
        Ok(self.hits.iter().take(query.limit).cloned().collect())
    }
}

#[derive(Default)]
pub struct MockEmbedder {
    pub texts: Mutex<Vec<String>>,
}

impl MockEmbedder {
    pub fn calls(&self) -> usize {
        self.texts.lock().unwrap().len()
    }

    pub fn last_text(&self) -> Option<String> {
        self.texts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(vec![0.12, -0.4, 0.33])
    }
}

pub const DOC_42: &str = "TP53 mutations and apoptosis in colorectal tumours.";
pub const DOC_7: &str = "Aspirin use and risk of colorectal adenoma.";
pub const DOC_13: &str = "Dietary fibre and colorectal cancer incidence.";

/// Lexical engine returning 42 (raw 9.0) and 7 (raw 3.0).
pub fn lexical_corpus() -> MockLexical {
    MockLexical::new(&[(42, 9.0), (7, 3.0)])
        .with_document(42, DOC_42)
        .with_document(7, DOC_7)
        .with_document(13, DOC_13)
}

/// Vector engine returning two passages of 42 and one of 7.
pub fn vector_corpus() -> MockVector {
    MockVector::new(&[(1, 42, 0.9), (3, 7, 0.9), (2, 42, 0.45)])
}

pub fn test_config() -> OrchestratorConfig {
    OrchestratorConfig {
        lexical_index: "pubmed".to_string(),
        semantic_collection: "pubmed-passages".to_string(),
        stopwords: StopWords::english(),
        backend_timeout: Duration::from_millis(200),
        ..OrchestratorConfig::default()
    }
}

pub struct Fixture {
    pub lexical: Arc<MockLexical>,
    pub vector: Arc<MockVector>,
    pub embedder: Arc<MockEmbedder>,
    pub orchestrator: QueryOrchestrator,
}

pub fn fixture_with(lexical: MockLexical, vector: MockVector) -> Fixture {
    let lexical = Arc::new(lexical);
    let vector = Arc::new(vector);
    let embedder = Arc::new(MockEmbedder::default());

    let orchestrator = QueryOrchestrator::new(test_config())
        .with_lexical_backend(lexical.clone())
        .with_vector_backend(vector.clone())
        .with_embedder(embedder.clone());

    Fixture {
        lexical,
        vector,
        embedder,
        orchestrator,
    }
}

pub fn fixture() -> Fixture {
    fixture_with(lexical_corpus(), vector_corpus())
}
