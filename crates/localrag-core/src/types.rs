//! Domain types shared by the chunker, the stores and the orchestrators.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type ChunkId = String;
pub type DocId = String;
pub type Meta = HashMap<String, String>;

/// Metadata key holding the original source path of a document.
pub const META_SOURCE: &str = "source";
/// Metadata key holding the file name of the source, used in citations.
pub const META_FILE_NAME: &str = "file_name";

/// A converted and cleaned source document.
///
/// The id is derived from the text so re-ingesting the same paper overwrites
/// its previous records instead of duplicating them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub text: String,
    pub meta: Meta,
}

impl Document {
    pub fn new(text: impl Into<String>, meta: Meta) -> Self {
        let text = text.into();
        Self { id: content_id(&text), text, meta }
    }

    pub fn with_id(id: impl Into<DocId>, text: impl Into<String>, meta: Meta) -> Self {
        Self { id: id.into(), text: text.into(), meta }
    }

    pub fn source(&self) -> Option<&str> { self.meta.get(META_SOURCE).map(String::as_str) }
}

/// First 16 hex chars of the BLAKE3 hash of `text`.
pub fn content_id(text: &str) -> DocId {
    let mut hex = blake3::hash(text.as_bytes()).to_hex().to_string();
    hex.truncate(16);
    hex
}

/// A bounded contiguous span of a document, the retrieval unit.
///
/// - `id`: `{doc_id}:{ordinal}`
/// - `word_start`/`word_end`: half-open span over the document's words
/// - `prev_id`/`next_id`: neighbours sharing overlap with this chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub doc_id: DocId,
    pub ordinal: usize,
    pub total_chunks: usize,
    pub word_start: usize,
    pub word_end: usize,
    pub text: String,
    pub prev_id: Option<ChunkId>,
    pub next_id: Option<ChunkId>,
    pub meta: Meta,
}

impl Chunk {
    pub fn chunk_id(doc_id: &str, ordinal: usize) -> ChunkId { format!("{doc_id}:{ordinal}") }

    pub fn word_len(&self) -> usize { self.word_end - self.word_start }
}

/// A chunk with its embedding attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// What the stores persist. Created on write, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedRecord {
    pub id: ChunkId,
    pub doc_id: DocId,
    pub ordinal: usize,
    pub text: String,
    pub vector: Option<Vec<f32>>,
    pub meta: Meta,
}

impl From<EmbeddedChunk> for IndexedRecord {
    fn from(ec: EmbeddedChunk) -> Self {
        let EmbeddedChunk { chunk, vector } = ec;
        Self { id: chunk.id, doc_id: chunk.doc_id, ordinal: chunk.ordinal, text: chunk.text, vector: Some(vector), meta: chunk.meta }
    }
}

impl From<Chunk> for IndexedRecord {
    fn from(chunk: Chunk) -> Self {
        Self { id: chunk.id, doc_id: chunk.doc_id, ordinal: chunk.ordinal, text: chunk.text, vector: None, meta: chunk.meta }
    }
}

/// Indicates which retrieval branch produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Vector,
    Keyword,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vector => f.write_str("vector"),
            Self::Keyword => f.write_str("keyword"),
        }
    }
}

/// A record with the branch-specific score it was retrieved with.
///
/// Cosine similarity for the vector branch, BM25 for the keyword branch.
/// Higher is always better, but the two are never compared directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub record: IndexedRecord,
    pub score: f32,
}

/// The ranked output of one retrieval branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub source: SourceKind,
    pub hits: Vec<ScoredRecord>,
}

impl RetrievalResult {
    pub fn new(source: SourceKind, hits: Vec<ScoredRecord>) -> Self { Self { source, hits } }

    /// A branch that did not run for this query.
    pub fn skipped(source: SourceKind) -> Self { Self { source, hits: Vec::new() } }

    pub fn is_empty(&self) -> bool { self.hits.is_empty() }

    pub fn len(&self) -> usize { self.hits.len() }
}

/// One entry of the fused context, keeping the provenance of both branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedRecord {
    pub record: IndexedRecord,
    pub vector: Option<BranchHit>,
    pub keyword: Option<BranchHit>,
}

impl FusedRecord {
    pub fn in_both(&self) -> bool { self.vector.is_some() && self.keyword.is_some() }
}

/// Zero-based rank and raw score of a record within one branch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchHit {
    pub rank: usize,
    pub score: f32,
}

/// Deduplicated, ordered, capped list of records handed to the assembler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusedContext {
    pub records: Vec<FusedRecord>,
}

impl FusedContext {
    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn ids(&self) -> Vec<&str> { self.records.iter().map(|r| r.record.id.as_str()).collect() }

    pub fn texts(&self) -> impl Iterator<Item = &str> { self.records.iter().map(|r| r.record.text.as_str()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}
