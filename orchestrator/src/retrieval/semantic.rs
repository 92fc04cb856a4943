// Semantic Retriever: embeds the query, searches passages, folds passages back into documents

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::{bounded, scale, SEMANTIC_SCORE_DECIMALS};
use crate::backend::{Backend, Embedder, VectorBackend, VectorQuery};
use crate::error::{Result, SearchError};
use crate::models::{DocumentId, RawSemanticHit, ScoreMap};

pub struct SemanticRetriever {
    backend: Option<Arc<dyn VectorBackend>>,
    embedder: Option<Arc<dyn Embedder>>,
    collection: String,
    timeout: Duration,
}

impl SemanticRetriever {
    pub fn new(collection: impl Into<String>, timeout: Duration) -> Self {
        Self {
            backend: None,
            embedder: None,
            collection: collection.into(),
            timeout,
        }
    }

    pub fn set_backend(&mut self, backend: Arc<dyn VectorBackend>) {
        self.backend = Some(backend);
    }

    pub fn set_embedder(&mut self, embedder: Arc<dyn Embedder>) {
        self.embedder = Some(embedder);
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some() && self.embedder.is_some()
    }

    pub async fn search(&self, query_text: &str, limit: usize, rescore: bool) -> Result<ScoreMap> {
        let backend = self
            .backend
            .as_ref()
            .ok_or(SearchError::BackendNotConfigured(Backend::Vector))?;
        let embedder = self
            .embedder
            .as_ref()
            .ok_or(SearchError::BackendNotConfigured(Backend::Embedding))?;

        let vector = bounded(Backend::Embedding, self.timeout, embedder.embed(query_text)).await?;

        let query = VectorQuery {
            collection: self.collection.clone(),
            vector,
            limit,
            rescore,
        };
        let hits = bounded(Backend::Vector, self.timeout, backend.search(&query)).await?;
        debug!("Semantic retrieval: {} passage hits for '{}'", hits.len(), query_text);

        Ok(aggregate(normalize_hits(hits)))
    }
}

/// Divides every hit by the first (best) hit's score, rounded to 5 decimals.
///
/// The engine returns hits sorted best first, so the first score is the batch maximum.
pub fn normalize_hits(hits: Vec<RawSemanticHit>) -> Vec<(DocumentId, f64)> {
    let Some(max_score) = hits.first().map(|h| h.raw_score) else {
        return Vec::new();
    };

    hits.into_iter()
        .map(|hit| (hit.document_id, round_score(scale(hit.raw_score, max_score))))
        .collect()
}

/// Sums the scores of passages that belong to the same document.
pub fn aggregate(scored: Vec<(DocumentId, f64)>) -> ScoreMap {
    let mut scores = ScoreMap::with_capacity(scored.len());
    for (document_id, score) in scored {
        scores.accumulate(document_id, score);
    }
    scores
}

fn round_score(score: f64) -> f64 {
    let factor = 10f64.powi(SEMANTIC_SCORE_DECIMALS);
    (score * factor).round() / factor
}
