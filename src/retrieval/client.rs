use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::{ScoredChunk, SemanticIndex};
use crate::config::{RequestConfig, RetrievalConfig};
use crate::error::{RetrievalError, RetrievalResult};

/// HTTP client for the semantic retrieval service
#[derive(Clone)]
pub struct HttpSemanticIndex {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    k: usize,
}

impl HttpSemanticIndex {
    /// Create a new retrieval client
    pub fn new(config: &RetrievalConfig, request_config: &RequestConfig) -> RetrievalResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(RetrievalError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SemanticIndex for HttpSemanticIndex {
    async fn search(&self, query: &str, k: usize) -> RetrievalResult<Vec<ScoredChunk>> {
        let url = format!("{}/api/search", self.base_url);

        debug!(query = %query, k, "Searching semantic index");

        let response = self
            .client
            .post(&url)
            .json(&SearchRequest { query, k })
            .send()
            .await
            .map_err(RetrievalError::Http)?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let chunks: Vec<ScoredChunk> =
            response
                .json()
                .await
                .map_err(|e| RetrievalError::InvalidResponse {
                    message: format!("Failed to parse search response: {}", e),
                })?;

        debug!(results = chunks.len(), "Semantic index returned results");

        Ok(chunks)
    }
}
