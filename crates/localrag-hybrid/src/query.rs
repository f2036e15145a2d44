//! Query orchestrator: both retrieval branches concurrently, then fuse,
//! assemble and generate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use localrag_core::config::{RetrievalMode, RetrievalSettings};
use localrag_core::error::{Error, Result};
use localrag_core::traits::{Embedder, Generator, KeywordStore, VectorStore};
use localrag_core::types::{FusedContext, RetrievalResult, SourceKind};

use crate::context::ContextAssembler;
use crate::fusion::fuse;
use crate::ingest::check_dimensions;
use crate::pipeline::QueryStage;

/// A generated answer with the context it was conditioned on.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub context: FusedContext,
    pub prompt: String,
}

pub struct QueryPipeline {
    embedder: Arc<dyn Embedder>,
    vector: Arc<dyn VectorStore>,
    keyword: Arc<dyn KeywordStore>,
    generator: Arc<dyn Generator>,
    assembler: ContextAssembler,
    retrieval: RetrievalSettings,
}

impl QueryPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector: Arc<dyn VectorStore>,
        keyword: Arc<dyn KeywordStore>,
        generator: Arc<dyn Generator>,
        assembler: ContextAssembler,
        retrieval: RetrievalSettings,
    ) -> Result<Self> {
        check_dimensions(embedder.as_ref(), vector.as_ref())?;
        Ok(Self { embedder, vector, keyword, generator, assembler, retrieval })
    }

    pub fn mode(&self) -> RetrievalMode { self.retrieval.mode }

    pub fn with_mode(mut self, mode: RetrievalMode) -> Self {
        self.retrieval.mode = mode;
        self
    }

    async fn vector_branch(&self, question: &str) -> Result<RetrievalResult> {
        if !self.retrieval.mode.uses_vector() {
            return Ok(RetrievalResult::skipped(SourceKind::Vector));
        }
        let started = Instant::now();
        let embedding = self.embedder.embed(question).await?;
        tracing::debug!(stage = %QueryStage::EmbedQuestion, elapsed_ms = started.elapsed().as_millis() as u64, "question embedded");
        let hits = self.vector.query(&embedding, self.retrieval.vector_top_k).await?;
        tracing::debug!(stage = %QueryStage::VectorRetrieve, hits = hits.len(), elapsed_ms = started.elapsed().as_millis() as u64, "vector branch done");
        Ok(RetrievalResult::new(SourceKind::Vector, hits))
    }

    async fn keyword_branch(&self, question: &str) -> Result<RetrievalResult> {
        if !self.retrieval.mode.uses_keyword() {
            return Ok(RetrievalResult::skipped(SourceKind::Keyword));
        }
        let started = Instant::now();
        let hits = self.keyword.query(question, self.retrieval.keyword_top_k).await?;
        tracing::debug!(stage = %QueryStage::KeywordRetrieve, hits = hits.len(), elapsed_ms = started.elapsed().as_millis() as u64, "keyword branch done");
        Ok(RetrievalResult::new(SourceKind::Keyword, hits))
    }

    /// Retrieve and fuse without generating.
    pub async fn retrieve(&self, question: &str) -> Result<FusedContext> {
        // The first failing branch drops the other one.
        let (vector, keyword) = tokio::try_join!(self.vector_branch(question), self.keyword_branch(question))?;
        let fused = fuse(&vector, &keyword, self.retrieval.fused_top_k);
        tracing::debug!(stage = %QueryStage::Fuse, records = fused.len(), "context fused");
        Ok(fused)
    }

    async fn run(&self, question: &str) -> Result<Answer> {
        let started = Instant::now();
        let context = self.retrieve(question).await?;
        let assembled = self.assembler.assemble(&context, question);
        tracing::debug!(stage = %QueryStage::Assemble, included = assembled.included, dropped = assembled.dropped, "prompt assembled");
        let text = self.generator.generate(&assembled.prompt).await?;
        tracing::info!(
            stage = %QueryStage::Generate,
            model = self.generator.model(),
            context = context.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "question answered"
        );
        Ok(Answer { text, context, prompt: assembled.prompt })
    }

    /// Answer a question, bounded by `retrieval.query_timeout_secs` if set.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        match self.retrieval.query_timeout_secs.map(Duration::from_secs) {
            Some(limit) => tokio::time::timeout(limit, self.run(question)).await.map_err(|_| Error::Timeout(limit))?,
            None => self.run(question).await,
        }
    }

    /// Like [`answer`](Self::answer), aborting every in-flight call once
    /// `cancel` fires.
    pub async fn answer_with_cancel(&self, question: &str, cancel: &CancellationToken) -> Result<Answer> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("query cancelled");
                Err(Error::Cancelled)
            }
            answer = self.answer(question) => answer,
        }
    }
}
