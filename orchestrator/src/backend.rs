use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::{DocumentId, RawSemanticHit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Lexical,
    Vector,
    Embedding,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Lexical => "lexical",
            Backend::Vector => "vector",
            Backend::Embedding => "embedding",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexicalQuery {
    pub index: String,
    pub text: String,
    pub fields: Vec<String>,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalHit {
    pub document_id: DocumentId,
    pub score: f64,
}

/// One batch of full-text hits, in engine order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LexicalHits {
    /// Batch maximum as reported by the engine, when it reports one.
    pub max_score: Option<f64>,
    pub hits: Vec<LexicalHit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorQuery {
    pub collection: String,
    pub vector: Vec<f32>,
    pub limit: usize,
    /// Forwarded to the engine's quantization search parameters untouched.
    pub rescore: bool,
}

#[async_trait]
pub trait LexicalBackend: Send + Sync {
    /// Multi-field full-text match.
    async fn search(&self, query: &LexicalQuery) -> Result<LexicalHits>;

    /// Exact-match lookup by document id; returns the stored full text of the first hit.
    async fn lookup(&self, index: &str, document_id: DocumentId) -> Result<Option<String>>;
}

#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Nearest-neighbour search. Hits come back sorted by descending similarity.
    async fn search(&self, query: &VectorQuery) -> Result<Vec<RawSemanticHit>>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Reads a document id stored either as a JSON number or as a numeric string.
pub(crate) fn parse_document_id(value: &serde_json::Value) -> Option<DocumentId> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
