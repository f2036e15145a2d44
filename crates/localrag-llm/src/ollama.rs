//! Non-streaming completion client for an Ollama server (`POST /api/generate`).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use localrag_core::config::GeneratorSettings;
use localrag_core::error::{Error, Result};
use localrag_core::traits::Generator;

pub struct OllamaGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaGenerator {
    pub fn new(url: &str, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("generator http client: {e}")))?;
        Ok(Self { client, endpoint: format!("{}/api/generate", url.trim_end_matches('/')), model: model.into(), timeout })
    }

    pub fn from_settings(settings: &GeneratorSettings) -> Result<Self> {
        Self::new(&settings.url, settings.model.clone(), settings.timeout())
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model(&self) -> &str { &self.model }

    /// One attempt, no retry. Timeouts and transport failures surface as
    /// generation errors.
    async fn generate(&self, prompt: &str) -> Result<String> {
        let started = Instant::now();
        debug!(model = %self.model, prompt_chars = prompt.len(), "generating");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest { model: &self.model, prompt, stream: false })
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "generation request failed");
                if e.is_timeout() {
                    Error::generation(format!("no reply from {} within {:?}", self.model, self.timeout))
                } else {
                    Error::generation(format!("request to {} failed: {e}", self.endpoint))
                }
            })?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
            error!(%status, "generator service error");
            return Err(Error::generation(format!("service returned {status}: {detail}")));
        }
        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(format!("failed to parse response: {e}")))?;
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, answer_chars = parsed.response.len(), "generated");
        Ok(parsed.response.trim().to_string())
    }
}
