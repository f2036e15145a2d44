//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_GENERATOR__MODEL=llama3`).
//! Every setting has a default matching the reference deployment, so an empty
//! directory is a valid configuration.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    /// Load from the current working directory.
    pub fn load() -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| Error::Configuration(format!("cannot read working directory: {e}")))?;
        Self::load_from(&cwd)
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        tracing::debug!(env = %env_name, dir = %dir.display(), "configuration sources merged");

        Ok(Self::from_figment(figment, dir))
    }

    pub fn from_figment(figment: Figment, base_dir: &Path) -> Self {
        Self { figment, base_dir: base_dir.to_path_buf() }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::Configuration(format!("Failed to get '{key}': {e}")))
    }

    /// Extract, resolve paths against the config directory, and validate.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::Configuration(e.to_string()))?;
        settings.vector_store.uri = resolve_with_base(&self.base_dir, settings.vector_store.uri.to_string_lossy());
        settings.keyword_store.index_dir = resolve_with_base(&self.base_dir, settings.keyword_store.index_dir.to_string_lossy());
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub splitter: SplitterSettings,
    pub cleaner: CleanerSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub keyword_store: KeywordStoreSettings,
    pub retrieval: RetrievalSettings,
    pub generator: GeneratorSettings,
    pub prompt: PromptSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.splitter.validate()?;
        if self.embedding.dimension == 0 {
            return Err(Error::Configuration("embedding.dimension must be positive".into()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::Configuration("embedding.batch_size must be positive".into()));
        }
        let r = &self.retrieval;
        if r.vector_top_k == 0 || r.keyword_top_k == 0 || r.fused_top_k == 0 {
            return Err(Error::Configuration("retrieval top_k values must be positive".into()));
        }
        if self.generator.timeout_secs == 0 || self.embedding.timeout_secs == 0 {
            return Err(Error::Configuration("service timeouts must be positive".into()));
        }
        if self.vector_store.table.trim().is_empty() {
            return Err(Error::Configuration("vector_store.table must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterSettings {
    pub split_length: usize,
    pub split_overlap: usize,
    pub respect_sentence_boundary: bool,
}

impl Default for SplitterSettings {
    fn default() -> Self { Self { split_length: 250, split_overlap: 50, respect_sentence_boundary: true } }
}

impl SplitterSettings {
    pub fn validate(&self) -> Result<()> {
        if self.split_length == 0 || self.split_overlap == 0 || self.split_overlap >= self.split_length {
            return Err(Error::NonTerminatingSplit { split_length: self.split_length, split_overlap: self.split_overlap });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerSettings {
    pub remove_empty_lines: bool,
    pub remove_extra_whitespaces: bool,
}

impl Default for CleanerSettings {
    fn default() -> Self { Self { remove_empty_lines: true, remove_extra_whitespaces: true } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub url: String,
    pub model: String,
    pub dimension: usize,
    pub timeout_secs: u64,
    pub batch_size: usize,
    /// Use the deterministic hashing embedder instead of the service.
    pub fake: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".into(),
            model: "nomic-embed-text".into(),
            dimension: 768,
            timeout_secs: 60,
            batch_size: 32,
            fake: false,
        }
    }
}

impl EmbeddingSettings {
    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    Lance,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    pub backend: VectorBackend,
    pub uri: PathBuf,
    pub table: String,
    /// Wipe both indexes when they are opened for ingestion.
    pub recreate: bool,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Lance,
            uri: PathBuf::from("~/.local/share/localrag/lancedb"),
            table: "my_paper_db".into(),
            recreate: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordBackend {
    Tantivy,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordStoreSettings {
    pub backend: KeywordBackend,
    pub index_dir: PathBuf,
    pub writer_heap_bytes: usize,
}

impl Default for KeywordStoreSettings {
    fn default() -> Self {
        Self {
            backend: KeywordBackend::Tantivy,
            index_dir: PathBuf::from("~/.local/share/localrag/tantivy"),
            writer_heap_bytes: 50_000_000,
        }
    }
}

/// Which retrieval branches run for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    Hybrid,
    Vector,
    Keyword,
}

impl RetrievalMode {
    pub fn uses_vector(self) -> bool { matches!(self, Self::Hybrid | Self::Vector) }

    pub fn uses_keyword(self) -> bool { matches!(self, Self::Hybrid | Self::Keyword) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub mode: RetrievalMode,
    pub vector_top_k: usize,
    pub keyword_top_k: usize,
    pub fused_top_k: usize,
    pub query_timeout_secs: Option<u64>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { mode: RetrievalMode::Hybrid, vector_top_k: 3, keyword_top_k: 3, fused_top_k: 5, query_timeout_secs: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for GeneratorSettings {
    fn default() -> Self { Self { url: "http://localhost:11434".into(), model: "phi3".into(), timeout_secs: 360 } }
}

impl GeneratorSettings {
    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Custom template with `{context}` and `{question}` slots.
    pub template: Option<String>,
    pub max_context_chars: usize,
}

impl Default for PromptSettings {
    fn default() -> Self { Self { template: None, max_context_chars: 12_000 } }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Config {
        Config::from_figment(Figment::new().merge(Toml::string(toml)), Path::new("/srv/rag"))
    }

    #[test]
    fn empty_config_yields_reference_defaults() {
        let s = from_toml("").settings().expect("settings");
        assert_eq!(s.splitter, SplitterSettings { split_length: 250, split_overlap: 50, respect_sentence_boundary: true });
        assert_eq!(s.embedding.model, "nomic-embed-text");
        assert_eq!(s.embedding.dimension, 768);
        assert_eq!(s.generator.model, "phi3");
        assert_eq!(s.generator.timeout(), Duration::from_secs(360));
        assert_eq!(s.retrieval.mode, RetrievalMode::Hybrid);
        assert_eq!(s.retrieval.fused_top_k, 5);
        assert_eq!(s.vector_store.table, "my_paper_db");
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let s = from_toml("[vector_store]\nuri = \"data/lancedb\"\n[keyword_store]\nindex_dir = \"/abs/tantivy\"\n")
            .settings()
            .expect("settings");
        assert_eq!(s.vector_store.uri, PathBuf::from("/srv/rag/data/lancedb"));
        assert_eq!(s.keyword_store.index_dir, PathBuf::from("/abs/tantivy"));
    }

    #[test]
    fn overlap_not_smaller_than_length_is_rejected() {
        let err = from_toml("[splitter]\nsplit_length = 50\nsplit_overlap = 50\n").settings().unwrap_err();
        assert!(matches!(err, Error::NonTerminatingSplit { split_length: 50, split_overlap: 50 }));
    }

    #[test]
    fn zero_top_k_is_a_configuration_error() {
        let err = from_toml("[retrieval]\nfused_top_k = 0\n").settings().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn retrieval_mode_parses_lowercase() {
        let s = from_toml("[retrieval]\nmode = \"keyword\"\n").settings().expect("settings");
        assert!(!s.retrieval.mode.uses_vector());
        assert!(s.retrieval.mode.uses_keyword());
    }

    #[test]
    fn get_reads_nested_keys() {
        let c = from_toml("[generator]\nmodel = \"llama3\"\n");
        let model: String = c.get("generator.model").expect("model");
        assert_eq!(model, "llama3");
    }
}
