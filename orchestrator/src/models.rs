use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SearchError;

/// Stable identifier of a logical document (the PubMed id in the medline corpus).
pub type DocumentId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document_id: DocumentId,
    pub score: f64,
}

/// Document id to relevance score, iterated in first-insertion order.
///
/// Overwriting an existing key keeps its original position, so ranking ties
/// resolve the same way for the same backend output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreMap {
    entries: Vec<ScoredDocument>,
    positions: HashMap<DocumentId, usize>,
}

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    /// Sets the score of `document_id`, replacing any previous value.
    pub fn insert(&mut self, document_id: DocumentId, score: f64) {
        match self.positions.get(&document_id) {
            Some(&idx) => self.entries[idx].score = score,
            None => self.push(document_id, score),
        }
    }

    /// Adds `score` to the current score of `document_id` (0 when absent).
    pub fn accumulate(&mut self, document_id: DocumentId, score: f64) {
        match self.positions.get(&document_id) {
            Some(&idx) => self.entries[idx].score += score,
            None => self.push(document_id, score),
        }
    }

    fn push(&mut self, document_id: DocumentId, score: f64) {
        self.positions.insert(document_id, self.entries.len());
        self.entries.push(ScoredDocument { document_id, score });
    }

    pub fn get(&self, document_id: DocumentId) -> Option<f64> {
        self.positions
            .get(&document_id)
            .map(|&idx| self.entries[idx].score)
    }

    pub fn contains(&self, document_id: DocumentId) -> bool {
        self.positions.contains_key(&document_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredDocument> {
        self.entries.iter()
    }

    pub fn max_score(&self) -> Option<f64> {
        self.entries.iter().map(|e| e.score).reduce(f64::max)
    }

    pub fn into_entries(self) -> Vec<ScoredDocument> {
        self.entries
    }
}

impl FromIterator<(DocumentId, f64)> for ScoreMap {
    fn from_iter<I: IntoIterator<Item = (DocumentId, f64)>>(iter: I) -> Self {
        let mut map = ScoreMap::new();
        for (document_id, score) in iter {
            map.insert(document_id, score);
        }
        map
    }
}

/// Point identifier assigned by the vector engine to one indexed passage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(String),
}

/// One passage hit as returned by the vector engine, before aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSemanticHit {
    pub internal_id: PointId,
    pub document_id: DocumentId,
    pub raw_score: f64,
}

/// Ranked `(document_id, score)` pairs, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RankedResult(pub Vec<ScoredDocument>);

impl RankedResult {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredDocument> {
        self.0.iter()
    }

    pub fn document_ids(&self) -> Vec<DocumentId> {
        self.0.iter().map(|e| e.document_id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydratedDocument {
    pub document_id: DocumentId,
    pub full_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    #[default]
    Lexical,
    Semantic,
    Hybrid,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Lexical => "lexical",
            Modality::Semantic => "semantic",
            Modality::Hybrid => "hybrid",
        }
    }

    /// Number of ranked entries kept for a request of `limit` results.
    ///
    /// Hybrid queries keep one extra slot so a blended document is not cut by
    /// the truncation; single-modality queries keep exactly `limit`.
    pub fn ranking_depth(&self, limit: usize) -> usize {
        match self {
            Modality::Hybrid => limit.saturating_add(1),
            Modality::Lexical | Modality::Semantic => limit,
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lexical" => Ok(Modality::Lexical),
            "semantic" => Ok(Modality::Semantic),
            "hybrid" => Ok(Modality::Hybrid),
            other => Err(SearchError::InvalidModality(other.to_string())),
        }
    }
}

pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_WEIGHT: f64 = 0.5;

/// A single retrieval request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub modality: Modality,
    pub lex_weight: f64,
    pub semantic_weight: f64,
    pub limit: usize,
    pub apply_stopwords: bool,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, modality: Modality) -> Self {
        Self {
            text: text.into(),
            modality,
            lex_weight: DEFAULT_WEIGHT,
            semantic_weight: DEFAULT_WEIGHT,
            limit: DEFAULT_LIMIT,
            apply_stopwords: true,
        }
    }

    pub fn with_weights(mut self, lex_weight: f64, semantic_weight: f64) -> Self {
        self.lex_weight = lex_weight;
        self.semantic_weight = semantic_weight;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_stopwords(mut self, apply_stopwords: bool) -> Self {
        self.apply_stopwords = apply_stopwords;
        self
    }
}

/// Runtime settings that may change after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    pub rescore: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { rescore: true }
    }
}

/// Output of one query: the ranking and the documents it hydrated, in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub ranked: RankedResult,
    pub documents: Vec<HydratedDocument>,
}

// API Request/Response models
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub modality: Option<String>,
    #[serde(default = "default_weight")]
    pub lex_weight: f64,
    #[serde(default = "default_weight")]
    pub semantic_weight: f64,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_true")]
    pub stopwords: bool,
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_true() -> bool {
    true
}

impl QueryRequest {
    pub fn into_search_query(self) -> Result<SearchQuery, SearchError> {
        let modality = match self.modality.as_deref() {
            Some(raw) => raw.parse()?,
            None => Modality::default(),
        };
        Ok(SearchQuery::new(self.query, modality)
            .with_weights(self.lex_weight, self.semantic_weight)
            .with_limit(self.limit)
            .with_stopwords(self.stopwords))
    }
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub request_id: Uuid,
    pub modality: Modality,
    pub results: Vec<ResultEntry>,
    pub took_ms: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResultEntry {
    pub document_id: DocumentId,
    pub score: f64,
    pub text: String,
}

impl ResultEntry {
    pub fn from_results(results: SearchResults) -> Vec<ResultEntry> {
        results
            .ranked
            .0
            .into_iter()
            .zip(results.documents)
            .map(|(scored, doc)| ResultEntry {
                document_id: scored.document_id,
                score: scored.score,
                text: doc.full_text,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct RescoreRequest {
    pub rescore: bool,
}
