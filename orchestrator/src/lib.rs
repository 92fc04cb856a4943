//! Hybrid lexical + semantic retrieval in front of a full-text engine, a
//! vector engine and an embedding service.
//!
//! [`QueryOrchestrator`] is the entry point: it normalizes the query, runs the
//! selected retrieval modality (fusing both in hybrid mode), ranks the scores
//! and hydrates the winning documents from the full-text engine.

pub mod api;
pub mod backend;
pub mod config;
pub mod embedding_client;
pub mod error;
pub mod lexical_client;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod orchestrator;
pub mod retrieval;
pub mod vector_client;

pub use backend::{Backend, Embedder, LexicalBackend, VectorBackend};
pub use error::{Result, SearchError};
pub use models::{
    DocumentId, HydratedDocument, Modality, RankedResult, RawSemanticHit, ScoreMap, SearchQuery,
    SearchResults, SearchSettings,
};
pub use orchestrator::{OrchestratorConfig, QueryOrchestrator};
