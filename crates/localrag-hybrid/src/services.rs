//! Process-wide service handles built once from [`Settings`] and passed
//! explicitly into the orchestrators.

use std::sync::Arc;

use localrag_core::chunker::DocumentSplitter;
use localrag_core::cleaner::DocumentCleaner;
use localrag_core::config::{KeywordBackend, Settings, VectorBackend};
use localrag_core::convert::ConverterSet;
use localrag_core::error::Result;
use localrag_core::traits::{Converter, Embedder, Generator, KeywordStore, VectorStore};
use localrag_embed::embedder_from_settings;
use localrag_llm::OllamaGenerator;
use localrag_text::TantivyKeywordStore;
use localrag_vector::{LanceVectorStore, MemoryVectorStore};

use crate::context::ContextAssembler;
use crate::ingest::IngestPipeline;
use crate::query::QueryPipeline;

#[derive(Clone)]
pub struct Services {
    pub settings: Settings,
    pub converter: Arc<dyn Converter>,
    pub embedder: Arc<dyn Embedder>,
    pub vector: Arc<dyn VectorStore>,
    pub keyword: Arc<dyn KeywordStore>,
    pub generator: Arc<dyn Generator>,
}

impl Services {
    /// Open the stores as they are. `vector_store.recreate` is not applied
    /// here, so answering a question never wipes an index.
    pub async fn from_settings(settings: Settings) -> Result<Self> { Self::build(settings, false).await }

    /// Open the stores for ingestion. With `vector_store.recreate`, the
    /// vector table is dropped and the keyword index cleared first.
    pub async fn for_ingest(settings: Settings) -> Result<Self> {
        let recreate = settings.vector_store.recreate;
        Self::build(settings, recreate).await
    }

    async fn build(settings: Settings, recreate: bool) -> Result<Self> {
        settings.validate()?;
        let embedder = embedder_from_settings(&settings.embedding)?;
        let vs = &settings.vector_store;
        let vector: Arc<dyn VectorStore> = match vs.backend {
            VectorBackend::Lance => Arc::new(LanceVectorStore::open(&vs.uri, &vs.table, settings.embedding.dimension, recreate).await?),
            VectorBackend::Memory => Arc::new(MemoryVectorStore::new(settings.embedding.dimension)),
        };
        let ks = &settings.keyword_store;
        let keyword: Arc<dyn KeywordStore> = match ks.backend {
            KeywordBackend::Tantivy => Arc::new(TantivyKeywordStore::open(&ks.index_dir, ks.writer_heap_bytes)?),
            KeywordBackend::Memory => Arc::new(TantivyKeywordStore::in_memory()?),
        };
        if recreate {
            keyword.reset().await?;
            tracing::warn!("indexes recreated");
        }
        let generator: Arc<dyn Generator> = Arc::new(OllamaGenerator::from_settings(&settings.generator)?);
        Ok(Self { settings, converter: Arc::new(ConverterSet::default()), embedder, vector, keyword, generator })
    }

    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn ingest_pipeline(&self) -> Result<IngestPipeline> {
        IngestPipeline::new(
            Arc::clone(&self.converter),
            DocumentCleaner::new(self.settings.cleaner),
            DocumentSplitter::from_settings(&self.settings.splitter)?,
            Arc::clone(&self.embedder),
            Arc::clone(&self.vector),
            Arc::clone(&self.keyword),
        )
    }

    pub fn query_pipeline(&self) -> Result<QueryPipeline> {
        QueryPipeline::new(
            Arc::clone(&self.embedder),
            Arc::clone(&self.vector),
            Arc::clone(&self.keyword),
            Arc::clone(&self.generator),
            ContextAssembler::from_settings(&self.settings.prompt)?,
            self.settings.retrieval,
        )
    }

    /// Clear both stores.
    pub async fn reset(&self) -> Result<()> {
        self.vector.reset().await?;
        self.keyword.reset().await?;
        tracing::warn!("vector and keyword stores reset");
        Ok(())
    }
}
