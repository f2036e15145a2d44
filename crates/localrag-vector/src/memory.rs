//! In-process vector store for tests and `backend = "memory"`.

use async_trait::async_trait;
use tokio::sync::RwLock;

use localrag_core::error::{Error, Result};
use localrag_core::traits::{validate_dimensions, validate_document, VectorStore};
use localrag_core::types::{IndexedRecord, ScoredRecord};

/// Brute-force cosine store. Records keep insertion order, so ties are
/// broken by which record was written first.
#[derive(Debug)]
pub struct MemoryVectorStore {
	dim: usize,
	records: RwLock<Vec<IndexedRecord>>,
}

impl MemoryVectorStore {
	pub fn new(dim: usize) -> Self { Self { dim, records: RwLock::new(Vec::new()) } }
}

/// Cosine similarity; 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
	let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}
	dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
	fn name(&self) -> &str { "memory" }

	fn dimension(&self) -> usize { self.dim }

	async fn write(&self, records: &[IndexedRecord]) -> Result<()> {
		validate_dimensions(records, self.dim)?;
		let mut store = self.records.write().await;
		for r in records {
			match store.iter_mut().find(|existing| existing.id == r.id) {
				Some(existing) => *existing = r.clone(),
				None => store.push(r.clone()),
			}
		}
		Ok(())
	}

	async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> {
		if vector.len() != self.dim {
			return Err(Error::DimensionMismatch { expected: self.dim, actual: vector.len() });
		}
		let store = self.records.read().await;
		let mut scored: Vec<ScoredRecord> = store
			.iter()
			.map(|r| {
				let score = r.vector.as_deref().map_or(0.0, |v| cosine_similarity(v, vector));
				ScoredRecord { record: IndexedRecord { vector: None, ..r.clone() }, score }
			})
			.collect();
		scored.sort_by(|a, b| b.score.total_cmp(&a.score));
		scored.truncate(top_k);
		Ok(scored)
	}

	async fn document(&self, doc_id: &str) -> Result<Vec<IndexedRecord>> {
		let mut records: Vec<IndexedRecord> = self.records.read().await.iter().filter(|r| r.doc_id == doc_id).cloned().collect();
		records.sort_by_key(|r| r.ordinal);
		Ok(records)
	}

	async fn replace_document(&self, doc_id: &str, records: &[IndexedRecord]) -> Result<()> {
		validate_document(records, doc_id)?;
		validate_dimensions(records, self.dim)?;
		let mut store = self.records.write().await;
		store.retain(|r| r.doc_id != doc_id);
		store.extend(records.iter().cloned());
		Ok(())
	}

	async fn delete_document(&self, doc_id: &str) -> Result<()> {
		self.records.write().await.retain(|r| r.doc_id != doc_id);
		Ok(())
	}

	async fn reset(&self) -> Result<()> {
		self.records.write().await.clear();
		Ok(())
	}

	async fn count(&self) -> Result<usize> { Ok(self.records.read().await.len()) }
}

#[cfg(test)]
mod tests {
	use super::*;
	use localrag_core::types::Meta;

	fn rec(id: &str, doc: &str, v: Vec<f32>) -> IndexedRecord {
		IndexedRecord { id: id.into(), doc_id: doc.into(), ordinal: 0, text: id.into(), vector: Some(v), meta: Meta::new() }
	}

	#[tokio::test]
	async fn nearest_first_and_capped_at_top_k() {
		let store = MemoryVectorStore::new(2);
		store.write(&[rec("far", "d", vec![0.0, 1.0]), rec("near", "d", vec![1.0, 0.1]), rec("mid", "d", vec![1.0, 1.0])]).await.expect("write");
		let hits = store.query(&[1.0, 0.0], 2).await.expect("query");
		let ids: Vec<_> = hits.iter().map(|h| h.record.id.as_str()).collect();
		assert_eq!(ids, vec!["near", "mid"]);
		assert!(hits[0].score > hits[1].score);
	}

	#[tokio::test]
	async fn rewrite_is_idempotent_and_rejects_wrong_dim() {
		let store = MemoryVectorStore::new(2);
		store.write(&[rec("a", "d", vec![1.0, 0.0])]).await.expect("write");
		store.write(&[rec("a", "d", vec![0.0, 1.0])]).await.expect("rewrite");
		assert_eq!(store.count().await.expect("count"), 1);
		let err = store.write(&[rec("b", "d", vec![1.0, 0.0]), rec("c", "d", vec![1.0])]).await.expect_err("bad dim");
		assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 1 }));
		assert_eq!(store.count().await.expect("count"), 1, "rejected batch must not be partially written");
	}

	#[tokio::test]
	async fn delete_document_removes_only_that_document() {
		let store = MemoryVectorStore::new(2);
		store.write(&[rec("x:0", "x", vec![1.0, 0.0]), rec("y:0", "y", vec![1.0, 0.0])]).await.expect("write");
		store.delete_document("x").await.expect("delete");
		let hits = store.query(&[1.0, 0.0], 5).await.expect("query");
		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].record.doc_id, "y");
	}

	#[tokio::test]
	async fn replace_document_drops_ids_missing_from_the_new_set() {
		let store = MemoryVectorStore::new(2);
		store.write(&[rec("x:0", "x", vec![1.0, 0.0]), rec("x:1", "x", vec![0.0, 1.0]), rec("y:0", "y", vec![1.0, 1.0])]).await.expect("write");
		store.replace_document("x", &[rec("x:0", "x", vec![0.5, 0.5])]).await.expect("replace");
		let x = store.document("x").await.expect("document");
		assert_eq!(x.len(), 1);
		assert_eq!(x[0].vector.as_deref(), Some(&[0.5, 0.5][..]));
		assert_eq!(store.count().await.expect("count"), 2);

		let err = store.replace_document("x", &[rec("x:0", "x", vec![1.0])]).await.expect_err("bad dim");
		assert!(matches!(err, Error::DimensionMismatch { .. }));
		assert!(store.replace_document("x", &[rec("y:1", "y", vec![1.0, 0.0])]).await.is_err());
		assert_eq!(store.document("x").await.expect("document").len(), 1, "rejected replacement leaves the document as it was");

		store.replace_document("x", &[]).await.expect("clear");
		assert!(store.document("x").await.expect("document").is_empty());
		assert_eq!(store.count().await.expect("count"), 1);
	}

	#[test]
	fn cosine_of_zero_vector_is_zero() {
		assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
		assert!((cosine_similarity(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
	}
}
