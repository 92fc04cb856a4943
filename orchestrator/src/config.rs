use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::lexical_client::{DEFAULT_ID_FIELD, DEFAULT_TEXT_FIELD};
use crate::orchestrator::{OrchestratorConfig, DEFAULT_LEXICAL_INDEX, DEFAULT_SEMANTIC_COLLECTION};
use crate::retrieval::StopWords;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub lexical_service_url: String,
    pub lexical_index: String,
    pub lexical_fields: Vec<String>,
    pub document_id_field: String,
    pub document_text_field: String,
    pub vector_db_service_url: String,
    pub vector_db_api_key: Option<String>,
    pub semantic_collection: String,
    pub embedding_service_url: String,
    pub rescore: bool,
    pub stopwords_file: Option<String>,
    pub backend_timeout_ms: u64,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            port: var("PORT", "8080")
                .parse()
                .context("PORT must be a port number")?,
            lexical_service_url: var("LEXICAL_SERVICE_URL", "http://localhost:9200"),
            lexical_index: var("LEXICAL_INDEX", DEFAULT_LEXICAL_INDEX),
            lexical_fields: parse_fields(&var("LEXICAL_FIELDS", DEFAULT_TEXT_FIELD)),
            document_id_field: var("DOCUMENT_ID_FIELD", DEFAULT_ID_FIELD),
            document_text_field: var("DOCUMENT_TEXT_FIELD", DEFAULT_TEXT_FIELD),
            vector_db_service_url: var("VECTOR_DB_SERVICE_URL", "http://localhost:6333"),
            vector_db_api_key: lookup("VECTOR_DB_API_KEY").filter(|key| !key.is_empty()),
            semantic_collection: var("SEMANTIC_COLLECTION", DEFAULT_SEMANTIC_COLLECTION),
            embedding_service_url: var("EMBEDDING_SERVICE_URL", "http://localhost:8002"),
            rescore: parse_bool(&var("RESCORE", "true")).context("RESCORE must be true or false")?,
            stopwords_file: lookup("STOPWORDS_FILE").filter(|path| !path.is_empty()),
            backend_timeout_ms: var("BACKEND_TIMEOUT_MS", "5000")
                .parse()
                .context("BACKEND_TIMEOUT_MS must be a number of milliseconds")?,
            log_level: var("LOG_LEVEL", "info"),
        })
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }

    pub fn stopwords(&self) -> Result<StopWords> {
        match &self.stopwords_file {
            Some(path) => StopWords::from_file(path)
                .with_context(|| format!("failed to read stop words from {}", path)),
            None => Ok(StopWords::english()),
        }
    }

    pub fn orchestrator_config(&self) -> Result<OrchestratorConfig> {
        Ok(OrchestratorConfig {
            lexical_index: self.lexical_index.clone(),
            semantic_collection: self.semantic_collection.clone(),
            lexical_fields: self.lexical_fields.clone(),
            stopwords: self.stopwords()?,
            rescore: self.rescore,
            backend_timeout: self.backend_timeout(),
        })
    }
}

/// Comma-separated field list. A list with no usable entries falls back to the text field.
fn parse_fields(raw: &str) -> Vec<String> {
    let fields: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(String::from)
        .collect();

    if fields.is_empty() {
        vec![DEFAULT_TEXT_FIELD.to_string()]
    } else {
        fields
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognised boolean '{}'", other),
    }
}
