// Lexical Retriever: full-text match scored against the batch maximum

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::{bounded, scale};
use crate::backend::{Backend, LexicalBackend, LexicalHits, LexicalQuery};
use crate::error::{Result, SearchError};
use crate::models::ScoreMap;

pub struct LexicalRetriever {
    backend: Option<Arc<dyn LexicalBackend>>,
    index: String,
    fields: Vec<String>,
    timeout: Duration,
}

impl LexicalRetriever {
    pub fn new(index: impl Into<String>, fields: Vec<String>, timeout: Duration) -> Self {
        Self {
            backend: None,
            index: index.into(),
            fields,
            timeout,
        }
    }

    pub fn set_backend(&mut self, backend: Arc<dyn LexicalBackend>) {
        self.backend = Some(backend);
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn search(&self, query_text: &str, limit: usize) -> Result<ScoreMap> {
        let backend = self
            .backend
            .as_ref()
            .ok_or(SearchError::BackendNotConfigured(Backend::Lexical))?;

        let query = LexicalQuery {
            index: self.index.clone(),
            text: query_text.to_string(),
            fields: self.fields.clone(),
            limit,
        };
        let hits = bounded(Backend::Lexical, self.timeout, backend.search(&query)).await?;
        debug!("Lexical retrieval: {} hits for '{}'", hits.hits.len(), query_text);

        Ok(normalize_hits(hits))
    }
}

/// Scales every hit by the batch maximum, so the best hit lands on 1.0.
pub fn normalize_hits(batch: LexicalHits) -> ScoreMap {
    let Some(max_score) = batch
        .max_score
        .or_else(|| batch.hits.iter().map(|h| h.score).reduce(f64::max))
    else {
        return ScoreMap::new();
    };

    let mut scores = ScoreMap::with_capacity(batch.hits.len());
    for hit in batch.hits {
        scores.insert(hit.document_id, scale(hit.score, max_score));
    }
    scores
}
