use std::path::Path;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::types::{Document, IndexedRecord, ScoredRecord};

/// Maps text to fixed-dimension vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier sent to the service (e.g. `nomic-embed-text`).
    fn model(&self) -> &str;
    fn dim(&self) -> usize;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("embedding service returned no vector"))
    }
}

/// Nearest-neighbour store over record vectors, cosine similarity.
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn name(&self) -> &str;
    fn dimension(&self) -> usize;
    /// Idempotent per record id. Rejects the whole batch before persisting
    /// anything if a vector is missing or has the wrong dimension.
    async fn write(&self, records: &[IndexedRecord]) -> Result<()>;
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>>;
    /// Every stored record of `doc_id`, vectors included, by ordinal.
    async fn document(&self, doc_id: &str) -> Result<Vec<IndexedRecord>>;
    /// Make `records` the complete set stored for `doc_id`, dropping ids the
    /// new set no longer has. Either the whole replacement lands or nothing
    /// changes. An empty `records` removes the document.
    async fn replace_document(&self, doc_id: &str, records: &[IndexedRecord]) -> Result<()>;
    async fn delete_document(&self, doc_id: &str) -> Result<()>;
    async fn reset(&self) -> Result<()>;
    async fn count(&self) -> Result<usize>;
}

/// BM25 store over record text.
#[async_trait]
pub trait KeywordStore: Send + Sync {
    /// Idempotent per record id.
    async fn write(&self, records: &[IndexedRecord]) -> Result<()>;
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<ScoredRecord>>;
    /// Same contract as [`VectorStore::replace_document`]: one commit, all or
    /// nothing.
    async fn replace_document(&self, doc_id: &str, records: &[IndexedRecord]) -> Result<()>;
    async fn delete_document(&self, doc_id: &str) -> Result<()>;
    async fn reset(&self) -> Result<()>;
    async fn count(&self) -> Result<usize>;
}

/// Text-completion service.
#[async_trait]
pub trait Generator: Send + Sync {
    fn model(&self) -> &str;
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Turns a source file into raw document text. Blocking.
pub trait Converter: Send + Sync {
    fn can_convert(&self, path: &Path) -> bool;
    fn convert(&self, path: &Path) -> Result<Document>;
}

/// Check every record belongs to `doc_id`.
pub fn validate_document(records: &[IndexedRecord], doc_id: &str) -> Result<()> {
    match records.iter().find(|r| r.doc_id != doc_id) {
        Some(r) => Err(Error::index(format!("record {} belongs to document {}, not {doc_id}", r.id, r.doc_id))),
        None => Ok(()),
    }
}

/// Check every record carries a vector of exactly `expected` components.
pub fn validate_dimensions(records: &[IndexedRecord], expected: usize) -> Result<()> {
    for r in records {
        match &r.vector {
            Some(v) if v.len() == expected => {}
            Some(v) => return Err(Error::DimensionMismatch { expected, actual: v.len() }),
            None => return Err(Error::embedding(format!("record {} has no vector", r.id))),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Meta;

    fn rec(id: &str, vector: Option<Vec<f32>>) -> IndexedRecord {
        IndexedRecord { id: id.into(), doc_id: "d".into(), ordinal: 0, text: String::new(), vector, meta: Meta::new() }
    }

    #[test]
    fn validate_dimensions_reports_first_mismatch() {
        let records = vec![rec("a", Some(vec![0.0; 4])), rec("b", Some(vec![0.0; 3]))];
        match validate_dimensions(&records, 4) {
            Err(Error::DimensionMismatch { expected: 4, actual: 3 }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn validate_document_rejects_foreign_records() {
        assert!(validate_document(&[rec("d:0", None)], "d").is_ok());
        assert!(matches!(validate_document(&[rec("d:0", None)], "e"), Err(Error::Index(_))));
    }

    #[test]
    fn validate_dimensions_rejects_missing_vectors() {
        assert!(validate_dimensions(&[rec("a", None)], 4).is_err());
        assert!(validate_dimensions(&[rec("a", Some(vec![1.0; 4]))], 4).is_ok());
    }
}
