//! Embedding server client speaking the `/embed` protocol.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Embedder, check_embeddings};
use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;
use crate::utils::{RetryConfig, with_retry};

/// Request body for the /embed endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
    normalize: bool,
    truncate: bool,
}

/// Response from the /embed endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse(Vec<Vec<f32>>);

/// Health response from the /health endpoint.
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
}

/// Client for a remote embedding server.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: Client,
    base_url: String,
    batch_size: usize,
    dimension: usize,
    retry: RetryConfig,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            batch_size: config.batch_size.max(1) as usize,
            dimension: config.dimension as usize,
            retry: RetryConfig::default(),
        })
    }

    /// Check if the embedding server is healthy and ready.
    pub async fn health_check(&self) -> Result<HealthResponse, EmbeddingError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmbeddingError::ServerError(format!(
                "health check failed with status: {}",
                response.status()
            )));
        }

        // Some servers answer 200 with an empty or non-JSON body
        let text = response.text().await.unwrap_or_default();
        Ok(serde_json::from_str(&text).unwrap_or(HealthResponse {
            status: Some("healthy".to_string()),
            model_id: None,
        }))
    }

    async fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/embed", self.base_url);
        let request = EmbedRequest {
            inputs: texts,
            normalize: true,
            truncate: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else if e.is_connect() {
                    EmbeddingError::ConnectionError(e.to_string())
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        Ok(embed_response.0)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            tracing::debug!(batch = batch.len(), url = %self.base_url, "embedding batch");
            let embeddings = with_retry(&self.retry, || self.embed_single_batch(batch))
                .await
                .into_result()?;
            all_embeddings.extend(embeddings);
        }

        check_embeddings(texts.len(), self.dimension, &all_embeddings)?;
        Ok(all_embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn describe(&self) -> String {
        format!("http ({})", self.base_url)
    }
}
