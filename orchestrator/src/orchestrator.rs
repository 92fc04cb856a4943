// Query Orchestrator: picks the modality, drives retrieval, ranking and hydration

use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::backend::{Backend, Embedder, LexicalBackend, VectorBackend};
use crate::error::{Result, SearchError};
use crate::lexical_client::DEFAULT_TEXT_FIELD;
use crate::metrics::QueryMetrics;
use crate::models::{
    DocumentId, HydratedDocument, Modality, ScoreMap, SearchQuery, SearchResults, SearchSettings,
};
use crate::retrieval::fusion::fuse_weighted;
use crate::retrieval::{
    normalize, rank, DocumentHydrator, FusionWeights, LexicalRetriever, SemanticRetriever,
    StopWords, DEFAULT_BACKEND_TIMEOUT,
};

pub const DEFAULT_LEXICAL_INDEX: &str = "medline-faiss-hnsw-lexical-pmid";
pub const DEFAULT_SEMANTIC_COLLECTION: &str = "medline-faiss-hnsw";

/// Static configuration fixed at construction.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub lexical_index: String,
    pub semantic_collection: String,
    pub lexical_fields: Vec<String>,
    pub stopwords: StopWords,
    pub rescore: bool,
    pub backend_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            lexical_index: DEFAULT_LEXICAL_INDEX.to_string(),
            semantic_collection: DEFAULT_SEMANTIC_COLLECTION.to_string(),
            lexical_fields: vec![DEFAULT_TEXT_FIELD.to_string()],
            stopwords: StopWords::empty(),
            rescore: true,
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
        }
    }
}

pub struct QueryOrchestrator {
    lexical: LexicalRetriever,
    semantic: SemanticRetriever,
    hydrator: DocumentHydrator,
    stopwords: StopWords,
    settings: RwLock<SearchSettings>,
    metrics: Option<QueryMetrics>,
}

impl QueryOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        let timeout = config.backend_timeout;
        Self {
            lexical: LexicalRetriever::new(
                config.lexical_index.clone(),
                config.lexical_fields,
                timeout,
            ),
            semantic: SemanticRetriever::new(config.semantic_collection, timeout),
            hydrator: DocumentHydrator::new(config.lexical_index, timeout),
            stopwords: config.stopwords,
            settings: RwLock::new(SearchSettings {
                rescore: config.rescore,
            }),
            metrics: None,
        }
    }

    /// The full-text engine serves both lexical retrieval and hydration.
    pub fn with_lexical_backend(mut self, backend: Arc<dyn LexicalBackend>) -> Self {
        self.lexical.set_backend(backend.clone());
        self.hydrator.set_backend(backend);
        self
    }

    pub fn with_vector_backend(mut self, backend: Arc<dyn VectorBackend>) -> Self {
        self.semantic.set_backend(backend);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.semantic.set_embedder(embedder);
        self
    }

    pub fn with_metrics(mut self, metrics: QueryMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn set_rescore(&self, rescore: bool) {
        self.settings.write().await.rescore = rescore;
        info!("Semantic rescoring {}", if rescore { "enabled" } else { "disabled" });
    }

    pub async fn settings(&self) -> SearchSettings {
        *self.settings.read().await
    }

    /// Strips stop words from a query using the configured set.
    pub fn normalize_query(&self, raw_text: &str) -> String {
        normalize(raw_text, &self.stopwords)
    }

    /// Runs a query and returns its hydrated documents, best first.
    pub async fn execute(&self, query: &SearchQuery) -> Result<Vec<HydratedDocument>> {
        self.search(query).await.map(|results| results.documents)
    }

    /// Runs a query and returns the ranking together with the hydrated documents.
    #[instrument(skip(self, query), fields(modality = %query.modality, limit = query.limit))]
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        let started = Instant::now();
        let outcome = self.run(query).await;

        match &outcome {
            Ok(results) => {
                info!(
                    "Query completed: {} documents in {} ms",
                    results.documents.len(),
                    started.elapsed().as_millis()
                );
                if let Some(metrics) = &self.metrics {
                    metrics.observe_success(query.modality, started.elapsed());
                }
            }
            Err(err) => {
                warn!("Query failed: {}", err);
                if let Some(metrics) = &self.metrics {
                    metrics.observe_failure(query.modality, err.backend());
                }
            }
        }

        outcome
    }

    pub async fn lexical_search(&self, query_text: &str, limit: usize) -> Result<ScoreMap> {
        self.lexical.search(query_text, limit).await
    }

    pub async fn semantic_search(&self, query_text: &str, limit: usize) -> Result<ScoreMap> {
        let rescore = self.settings().await.rescore;
        self.semantic.search(query_text, limit, rescore).await
    }

    pub async fn hydrate_document(&self, document_id: DocumentId) -> Result<HydratedDocument> {
        self.hydrator.hydrate_one(document_id).await
    }

    async fn run(&self, query: &SearchQuery) -> Result<SearchResults> {
        if query.limit == 0 {
            return Err(SearchError::InvalidLimit(query.limit));
        }
        let weights = match query.modality {
            Modality::Hybrid => Some(FusionWeights::new(query.lex_weight, query.semantic_weight)?),
            Modality::Lexical | Modality::Semantic => None,
        };
        if !self.hydrator.is_configured() {
            return Err(SearchError::BackendNotConfigured(Backend::Lexical));
        }

        let scores = self.retrieve(query, weights).await?;
        let ranked = rank(scores, query.modality.ranking_depth(query.limit));
        let documents = self.hydrator.hydrate(&ranked.document_ids()).await?;

        Ok(SearchResults { ranked, documents })
    }

    async fn retrieve(
        &self,
        query: &SearchQuery,
        weights: Option<FusionWeights>,
    ) -> Result<ScoreMap> {
        match query.modality {
            Modality::Lexical => {
                self.lexical_search(&self.lexical_text(query), query.limit)
                    .await
            }
            // Embedding models get the full natural-language query
            Modality::Semantic => self.semantic_search(&query.text, query.limit).await,
            Modality::Hybrid => {
                let weights = match weights {
                    Some(weights) => weights,
                    None => FusionWeights::new(query.lex_weight, query.semantic_weight)?,
                };
                let lexical_text = self.lexical_text(query);

                let (lexical, semantic) = tokio::try_join!(
                    self.lexical_search(&lexical_text, query.limit),
                    self.semantic_search(&query.text, query.limit),
                )?;

                Ok(fuse_weighted(&lexical, &semantic, weights))
            }
        }
    }

    fn lexical_text<'a>(&self, query: &'a SearchQuery) -> Cow<'a, str> {
        if query.apply_stopwords {
            Cow::Owned(self.normalize_query(&query.text))
        } else {
            Cow::Borrowed(query.text.as_str())
        }
    }
}
