//! Ingestion orchestrator: convert, clean, chunk, embed, write.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use localrag_core::chunker::DocumentSplitter;
use localrag_core::cleaner::DocumentCleaner;
use localrag_core::error::{Error, Result};
use localrag_core::traits::{Converter, Embedder, KeywordStore, VectorStore};
use localrag_core::types::{Chunk, DocId, Document, EmbeddedChunk, IndexedRecord};

use crate::pipeline::IngestStage;

/// Summary of one successfully written document.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub doc_id: DocId,
    pub source: Option<String>,
    pub chunks: usize,
    pub elapsed: Duration,
}

pub struct IngestPipeline {
    converter: Arc<dyn Converter>,
    cleaner: DocumentCleaner,
    splitter: DocumentSplitter,
    embedder: Arc<dyn Embedder>,
    vector: Arc<dyn VectorStore>,
    keyword: Arc<dyn KeywordStore>,
}

impl IngestPipeline {
    /// Fails with a configuration error when the embedder and the vector
    /// store disagree on the vector dimension.
    pub fn new(
        converter: Arc<dyn Converter>,
        cleaner: DocumentCleaner,
        splitter: DocumentSplitter,
        embedder: Arc<dyn Embedder>,
        vector: Arc<dyn VectorStore>,
        keyword: Arc<dyn KeywordStore>,
    ) -> Result<Self> {
        check_dimensions(embedder.as_ref(), vector.as_ref())?;
        Ok(Self { converter, cleaner, splitter, embedder, vector, keyword })
    }

    pub fn converter(&self) -> &dyn Converter { self.converter.as_ref() }

    /// Run the whole path for one source file.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport> {
        let started = Instant::now();
        tracing::info!(source = %path.display(), stage = %IngestStage::Received, "ingesting");
        let converter = Arc::clone(&self.converter);
        let owned: PathBuf = path.to_path_buf();
        let raw = tokio::task::spawn_blocking(move || converter.convert(&owned))
            .await
            .map_err(|e| Error::conversion(path.display().to_string(), e))??;
        tracing::debug!(source = %path.display(), chars = raw.text.len(), stage = %IngestStage::Converted, "converted");
        self.ingest_from(raw, started).await
    }

    /// Run the path for text that is already converted.
    pub async fn ingest_document(&self, raw: Document) -> Result<IngestReport> { self.ingest_from(raw, Instant::now()).await }

    async fn ingest_from(&self, raw: Document, started: Instant) -> Result<IngestReport> {
        let source = raw.source().map(str::to_string);
        let doc = self.cleaner.clean(&raw);
        if doc.text.is_empty() {
            return Err(Error::conversion(source.unwrap_or_else(|| raw.id.clone()), "no text left after cleaning"));
        }
        tracing::debug!(doc_id = %doc.id, chars = doc.text.len(), stage = %IngestStage::Cleaned, "cleaned");

        let chunks = self.splitter.split(&doc);
        tracing::debug!(doc_id = %doc.id, chunks = chunks.len(), stage = %IngestStage::Chunked, "chunked");

        let embedded = self.embed(chunks).await?;
        tracing::debug!(doc_id = %doc.id, stage = %IngestStage::Embedded, "embedded");

        let records: Vec<IndexedRecord> = embedded.into_iter().map(IndexedRecord::from).collect();
        self.write(&doc.id, &records).await?;
        let report = IngestReport { doc_id: doc.id, source, chunks: records.len(), elapsed: started.elapsed() };
        tracing::info!(
            doc_id = %report.doc_id,
            chunks = report.chunks,
            elapsed_ms = report.elapsed.as_millis() as u64,
            stage = %IngestStage::Written,
            "document ingested"
        );
        Ok(report)
    }

    async fn embed(&self, chunks: Vec<Chunk>) -> Result<Vec<EmbeddedChunk>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(Error::embedding(format!("embedder returned {} vectors for {} chunks", vectors.len(), chunks.len())));
        }
        let dim = self.embedder.dim();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(Error::DimensionMismatch { expected: dim, actual: bad.len() });
        }
        Ok(chunks.into_iter().zip(vectors).map(|(chunk, vector)| EmbeddedChunk { chunk, vector }).collect())
    }

    /// Vector store first, then keyword store. Each store swaps in the new
    /// chunk set for the document in one step. A keyword failure puts the
    /// document's previous vector records back, so both stores keep what they
    /// held before.
    async fn write(&self, doc_id: &str, records: &[IndexedRecord]) -> Result<()> {
        let previous = self.vector.document(doc_id).await?;
        self.vector.replace_document(doc_id, records).await?;
        if let Err(err) = self.keyword.replace_document(doc_id, records).await {
            tracing::warn!(doc_id, restored = previous.len(), error = %err, "keyword write failed, restoring vector records");
            if let Err(rollback) = self.vector.replace_document(doc_id, &previous).await {
                tracing::error!(doc_id, error = %rollback, "vector rollback failed");
            }
            return Err(err);
        }
        Ok(())
    }
}

pub(crate) fn check_dimensions(embedder: &dyn Embedder, vector: &dyn VectorStore) -> Result<()> {
    if embedder.dim() != vector.dimension() {
        return Err(Error::Configuration(format!(
            "embedder {} produces {}-dim vectors but vector store '{}' is configured for {}",
            embedder.model(),
            embedder.dim(),
            vector.name(),
            vector.dimension()
        )));
    }
    Ok(())
}
