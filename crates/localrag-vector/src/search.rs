use async_trait::async_trait;
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::DistanceType;

use localrag_core::error::{Error, Result};
use localrag_core::traits::VectorStore;
use localrag_core::types::{IndexedRecord, Meta, ScoredRecord};

use crate::schema::VECTOR_COLUMN;
use crate::writer::{doc_predicate, LanceVectorStore};

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<T>())
		.ok_or_else(|| Error::index(format!("vector result column '{name}' missing")))
}

/// Decode the stored columns of every row in `batch`. Vectors are copied
/// out only when `with_vectors` is set.
fn decode_records(batch: &RecordBatch, with_vectors: bool) -> Result<Vec<IndexedRecord>> {
	let ids = column::<StringArray>(batch, "id")?;
	let doc_ids = column::<StringArray>(batch, "doc_id")?;
	let ordinals = column::<Int32Array>(batch, "ordinal")?;
	let contents = column::<StringArray>(batch, "content")?;
	let metas = column::<StringArray>(batch, "meta")?;
	let vectors = if with_vectors { Some(column::<FixedSizeListArray>(batch, VECTOR_COLUMN)?) } else { None };
	let mut out = Vec::with_capacity(batch.num_rows());
	for i in 0..batch.num_rows() {
		let vector = match vectors {
			Some(list) if !list.is_null(i) => {
				let values = list.value(i);
				let floats = values
					.as_any()
					.downcast_ref::<Float32Array>()
					.ok_or_else(|| Error::index("vector column is not float32"))?;
				Some(floats.values().to_vec())
			}
			_ => None,
		};
		out.push(IndexedRecord {
			id: ids.value(i).to_string(),
			doc_id: doc_ids.value(i).to_string(),
			ordinal: usize::try_from(ordinals.value(i)).unwrap_or(0),
			text: contents.value(i).to_string(),
			vector,
			meta: serde_json::from_str::<Meta>(metas.value(i)).unwrap_or_default(),
		});
	}
	Ok(out)
}

/// Decode a result batch into records scored by cosine similarity.
fn decode_batch(batch: &RecordBatch, out: &mut Vec<ScoredRecord>) -> Result<()> {
	let distances = column::<Float32Array>(batch, "_distance")?;
	for (i, record) in decode_records(batch, false)?.into_iter().enumerate() {
		let score = if distances.is_null(i) { 0.0 } else { 1.0 - distances.value(i) };
		out.push(ScoredRecord { record, score });
	}
	Ok(())
}

impl LanceVectorStore {
	/// Nearest neighbours of `vector` by cosine distance, best first.
	pub async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> {
		if vector.len() != self.dim {
			return Err(Error::DimensionMismatch { expected: self.dim, actual: vector.len() });
		}
		if top_k == 0 || self.row_count().await? == 0 { return Ok(Vec::new()); }
		let mut stream = self
			.table
			.vector_search(vector.to_vec())
			.map_err(Error::index)?
			.column(VECTOR_COLUMN)
			.distance_type(DistanceType::Cosine)
			.limit(top_k)
			.execute()
			.await
			.map_err(Error::index)?;
		let mut hits = Vec::with_capacity(top_k);
		while let Some(batch) = stream.try_next().await.map_err(Error::index)? {
			decode_batch(&batch, &mut hits)?;
		}
		hits.sort_by(|a, b| b.score.total_cmp(&a.score));
		hits.truncate(top_k);
		Ok(hits)
	}

	/// Stored rows of one document, vectors included, by ordinal.
	pub async fn document_records(&self, doc_id: &str) -> Result<Vec<IndexedRecord>> {
		let mut stream = self.table.query().only_if(doc_predicate(doc_id)).execute().await.map_err(Error::index)?;
		let mut records = Vec::new();
		while let Some(batch) = stream.try_next().await.map_err(Error::index)? {
			records.extend(decode_records(&batch, true)?);
		}
		records.sort_by_key(|r| r.ordinal);
		Ok(records)
	}

	pub async fn row_count(&self) -> Result<usize> {
		self.table.count_rows(None).await.map_err(Error::index)
	}
}

#[async_trait]
impl VectorStore for LanceVectorStore {
	fn name(&self) -> &str { "lancedb" }

	fn dimension(&self) -> usize { self.dim }

	async fn write(&self, records: &[IndexedRecord]) -> Result<()> { self.upsert(records).await }

	async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> { self.search(vector, top_k).await }

	async fn document(&self, doc_id: &str) -> Result<Vec<IndexedRecord>> { self.document_records(doc_id).await }

	async fn replace_document(&self, doc_id: &str, records: &[IndexedRecord]) -> Result<()> { self.replace(doc_id, records).await }

	async fn delete_document(&self, doc_id: &str) -> Result<()> { self.delete_where(&doc_predicate(doc_id)).await }

	async fn reset(&self) -> Result<()> {
		self.delete_where("id IS NOT NULL").await?;
		tracing::info!(table = %self.table_name, "vector table reset");
		Ok(())
	}

	async fn count(&self) -> Result<usize> { self.row_count().await }
}
