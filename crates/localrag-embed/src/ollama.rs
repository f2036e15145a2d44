//! Embedding client for an Ollama server (`POST /api/embed`).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use localrag_core::config::EmbeddingSettings;
use localrag_core::error::{Error, Result};
use localrag_core::traits::Embedder;

pub struct OllamaEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dim: usize,
    batch_size: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaEmbedder {
    pub fn new(url: &str, model: impl Into<String>, dim: usize, timeout: Duration, batch_size: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("embedding http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/embed", url.trim_end_matches('/')),
            model: model.into(),
            dim,
            batch_size: batch_size.max(1),
        })
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        Self::new(&settings.url, settings.model.clone(), settings.dimension, settings.timeout(), settings.batch_size)
    }

    async fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!(model = %self.model, batch_size = texts.len(), "embedding batch");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { model: &self.model, input: texts })
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "embedding request failed");
                Error::embedding(format!("request to {} failed: {e}", self.endpoint))
            })?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
            error!(%status, "embedding service error");
            return Err(Error::embedding(format!("service returned {status}: {detail}")));
        }
        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("failed to parse response: {e}")))?;
        if parsed.embeddings.len() != texts.len() {
            return Err(Error::embedding(format!("service returned {} vectors for {} texts", parsed.embeddings.len(), texts.len())));
        }
        if let Some(bad) = parsed.embeddings.iter().find(|v| v.len() != self.dim) {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: bad.len() });
        }
        Ok(parsed.embeddings)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model(&self) -> &str { &self.model }

    fn dim(&self) -> usize { self.dim }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            out.extend(self.embed_chunk(chunk).await?);
        }
        Ok(out)
    }
}
