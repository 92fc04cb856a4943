use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::backend::{parse_document_id, Backend, VectorBackend, VectorQuery};
use crate::error::{Result, SearchError};
use crate::models::{PointId, RawSemanticHit};

/// Vector engine adapter speaking the Qdrant REST points API.
#[derive(Clone)]
pub struct QdrantClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    id_field: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: PointId,
    score: f64,
    #[serde(default)]
    payload: Option<Map<String, Value>>,
}

impl QdrantClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::from_http(Backend::Vector, timeout, e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            id_field: crate::lexical_client::DEFAULT_ID_FIELD.to_string(),
            timeout,
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Payload key holding the parent document id of each passage.
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    fn http_error(&self, err: reqwest::Error) -> SearchError {
        SearchError::from_http(Backend::Vector, self.timeout, err)
    }

    fn hit_from(&self, point: ScoredPoint) -> Result<RawSemanticHit> {
        let document_id = point
            .payload
            .as_ref()
            .and_then(|payload| payload.get(&self.id_field))
            .and_then(parse_document_id)
            .ok_or_else(|| {
                SearchError::malformed(
                    Backend::Vector,
                    format!("point {:?} has no numeric '{}' payload", point.id, self.id_field),
                )
            })?;

        Ok(RawSemanticHit {
            internal_id: point.id,
            document_id,
            raw_score: point.score,
        })
    }
}

#[async_trait]
impl VectorBackend for QdrantClient {
    async fn search(&self, query: &VectorQuery) -> Result<Vec<RawSemanticHit>> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, query.collection
        );
        let body = json!({
            "vector": query.vector,
            "limit": query.limit,
            "with_payload": true,
            "params": {
                "quantization": { "rescore": query.rescore }
            }
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        let response: SearchResponse = request
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| self.http_error(e))?
            .json()
            .await
            .map_err(|e| self.http_error(e))?;

        debug!(
            "Vector engine returned {} points from '{}' (rescore={})",
            response.result.len(),
            query.collection,
            query.rescore
        );

        response
            .result
            .into_iter()
            .map(|point| self.hit_from(point))
            .collect()
    }
}
