use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::backend::{parse_document_id, Backend, LexicalBackend, LexicalHit, LexicalHits, LexicalQuery};
use crate::error::{Result, SearchError};
use crate::models::DocumentId;

pub const DEFAULT_ID_FIELD: &str = "pmid";
pub const DEFAULT_TEXT_FIELD: &str = "full_text";

/// Full-text engine adapter speaking the Elasticsearch `_search` API.
#[derive(Clone)]
pub struct ElasticClient {
    client: Client,
    base_url: String,
    id_field: String,
    text_field: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    max_score: Option<f64>,
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: Map<String, Value>,
}

impl ElasticClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::from_http(Backend::Lexical, timeout, e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            text_field: DEFAULT_TEXT_FIELD.to_string(),
            timeout,
        })
    }

    /// Overrides the stored fields holding the document id and its display text.
    pub fn with_fields(mut self, id_field: impl Into<String>, text_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self.text_field = text_field.into();
        self
    }

    async fn post_search(&self, index: &str, body: &Value) -> Result<SearchResponse> {
        let url = format!("{}/{}/_search", self.base_url, index);
        self.client
            .post(&url)
            .json(body)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| self.http_error(e))?
            .json::<SearchResponse>()
            .await
            .map_err(|e| self.http_error(e))
    }

    fn http_error(&self, err: reqwest::Error) -> SearchError {
        SearchError::from_http(Backend::Lexical, self.timeout, err)
    }

    fn document_id(&self, source: &Map<String, Value>) -> Result<DocumentId> {
        source
            .get(&self.id_field)
            .and_then(parse_document_id)
            .ok_or_else(|| {
                SearchError::malformed(
                    Backend::Lexical,
                    format!("hit without a numeric '{}' field", self.id_field),
                )
            })
    }
}

#[async_trait]
impl LexicalBackend for ElasticClient {
    async fn search(&self, query: &LexicalQuery) -> Result<LexicalHits> {
        let body = json!({
            "size": query.limit,
            "query": {
                "multi_match": {
                    "query": query.text,
                    "fields": query.fields,
                }
            }
        });

        let response = self.post_search(&query.index, &body).await?;
        debug!(
            "Lexical engine returned {} hits from '{}'",
            response.hits.hits.len(),
            query.index
        );

        let hits = response
            .hits
            .hits
            .iter()
            .map(|hit| {
                Ok(LexicalHit {
                    document_id: self.document_id(&hit.source)?,
                    score: hit.score.unwrap_or(0.0),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(LexicalHits {
            max_score: response.hits.max_score,
            hits,
        })
    }

    async fn lookup(&self, index: &str, document_id: DocumentId) -> Result<Option<String>> {
        let mut term = Map::new();
        term.insert(self.id_field.clone(), json!(document_id));
        let body = json!({
            "size": 1,
            "query": { "term": term }
        });

        let response = self.post_search(index, &body).await?;
        let Some(hit) = response.hits.hits.into_iter().next() else {
            return Ok(None);
        };

        match hit.source.get(&self.text_field) {
            Some(Value::String(text)) => Ok(Some(text.clone())),
            _ => Err(SearchError::malformed(
                Backend::Lexical,
                format!("document {} has no '{}' text field", document_id, self.text_field),
            )),
        }
    }
}
