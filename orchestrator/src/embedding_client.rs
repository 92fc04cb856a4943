use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::backend::{Backend, Embedder};
use crate::error::{Result, SearchError};

/// Client for the embedding service (`POST /embed {"texts": [...]}`).
#[derive(Clone)]
pub struct EmbeddingServiceClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    texts: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl EmbeddingServiceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::from_http(Backend::Embedding, timeout, e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl Embedder for EmbeddingServiceClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response: EmbedResponse = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&EmbedRequest { texts: [text] })
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| SearchError::from_http(Backend::Embedding, self.timeout, e))?
            .json()
            .await
            .map_err(|e| SearchError::from_http(Backend::Embedding, self.timeout, e))?;

        match response.embeddings.into_iter().next() {
            Some(vector) if !vector.is_empty() => Ok(vector),
            _ => Err(SearchError::malformed(
                Backend::Embedding,
                "embedding service returned no vector",
            )),
        }
    }
}
