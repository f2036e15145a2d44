//! localrag-embed
//!
//! Embedder implementations: the Ollama embedding service client and a
//! deterministic hashing embedder for offline use.

use std::sync::Arc;

use localrag_core::config::EmbeddingSettings;
use localrag_core::error::Result;
use localrag_core::traits::Embedder;

pub mod fake;
pub mod ollama;

pub use fake::FakeEmbedder;
pub use ollama::OllamaEmbedder;

/// `APP_USE_FAKE_EMBEDDINGS=1` forces the hashing embedder regardless of config.
pub fn use_fake_from_env() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn embedder_from_settings(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if settings.fake || use_fake_from_env() {
        tracing::info!(dim = settings.dimension, "using fake embedder");
        return Ok(Arc::new(FakeEmbedder::new(settings.dimension)));
    }
    tracing::info!(model = %settings.model, url = %settings.url, "using ollama embedder");
    Ok(Arc::new(OllamaEmbedder::from_settings(settings)?))
}
