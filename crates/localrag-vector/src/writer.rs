use std::path::Path;
use std::sync::Arc;

use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use chrono::Utc;
use lancedb::Table;
use tokio::sync::Mutex;

use localrag_core::error::{Error, Result};
use localrag_core::traits::{validate_dimensions, validate_document};
use localrag_core::types::IndexedRecord;

use crate::schema::build_arrow_schema;
use crate::table::{ensure_table, open_db, remove_table_dir};

/// Vector store backed by one LanceDB table.
pub struct LanceVectorStore {
	pub(crate) table: Table,
	pub(crate) table_name: String,
	pub(crate) dim: usize,
	write_lock: Mutex<()>,
}

impl LanceVectorStore {
	/// Connect to the database at `uri` and open (or create) `table_name`.
	/// With `recreate`, any existing table is dropped first.
	pub async fn open(uri: &Path, table_name: &str, dim: usize, recreate: bool) -> Result<Self> {
		if recreate {
			remove_table_dir(uri, table_name)?;
		}
		let conn = open_db(uri).await?;
		let table = ensure_table(&conn, table_name, dim).await?;
		tracing::info!(uri = %uri.display(), table = table_name, dim, "vector store opened");
		Ok(Self { table, table_name: table_name.to_string(), dim, write_lock: Mutex::new(()) })
	}

	pub fn table_name(&self) -> &str { &self.table_name }

	/// Upsert records keyed on `id`; every record must carry a `dim`-wide vector.
	pub async fn upsert(&self, records: &[IndexedRecord]) -> Result<()> {
		if records.is_empty() { return Ok(()); }
		self.merge(records, None).await
	}

	/// Upsert `records` and delete the rows of `doc_id` they do not cover,
	/// in one table commit.
	pub async fn replace(&self, doc_id: &str, records: &[IndexedRecord]) -> Result<()> {
		let predicate = doc_predicate(doc_id);
		if records.is_empty() { return self.delete_where(&predicate).await; }
		validate_document(records, doc_id)?;
		self.merge(records, Some(predicate)).await
	}

	async fn merge(&self, records: &[IndexedRecord], stale: Option<String>) -> Result<()> {
		validate_dimensions(records, self.dim)?;
		let batch = self.records_to_batch(records)?;
		let schema = batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
		let _guard = self.write_lock.lock().await;
		// Upsert behavior via merge_insert: id is unique
		let mut mi = self.table.merge_insert(&["id"]);
		mi.when_matched_update_all(None).when_not_matched_insert_all();
		if let Some(filter) = stale {
			mi.when_not_matched_by_source_delete(Some(filter));
		}
		mi.execute(reader).await.map_err(Error::index)?;
		tracing::debug!(table = %self.table_name, records = records.len(), "vector records written");
		Ok(())
	}

	pub async fn delete_where(&self, predicate: &str) -> Result<()> {
		let _guard = self.write_lock.lock().await;
		self.table.delete(predicate).await.map_err(Error::index)?;
		Ok(())
	}

	fn records_to_batch(&self, records: &[IndexedRecord]) -> Result<RecordBatch> {
		let width = i32::try_from(self.dim).map_err(Error::index)?;
		let now = Utc::now().timestamp_millis();
		let mut ids = Vec::with_capacity(records.len());
		let mut doc_ids = Vec::with_capacity(records.len());
		let mut ordinals = Vec::with_capacity(records.len());
		let mut contents = Vec::with_capacity(records.len());
		let mut metas = Vec::with_capacity(records.len());
		let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(records.len());
		for r in records {
			ids.push(r.id.clone());
			doc_ids.push(r.doc_id.clone());
			ordinals.push(i32::try_from(r.ordinal).map_err(Error::index)?);
			contents.push(r.text.clone());
			metas.push(serde_json::to_string(&r.meta).map_err(Error::index)?);
			vectors.push(r.vector.as_ref().map(|v| v.iter().map(|&x| Some(x)).collect()));
		}
		RecordBatch::try_new(build_arrow_schema(width), vec![
			Arc::new(StringArray::from(ids)),
			Arc::new(StringArray::from(doc_ids)),
			Arc::new(Int32Array::from(ordinals)),
			Arc::new(StringArray::from(contents)),
			Arc::new(StringArray::from(metas)),
			Arc::new(TimestampMillisecondArray::from(vec![now; records.len()])),
			Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors.into_iter(), width)),
		])
		.map_err(Error::index)
	}
}

/// SQL string literal with embedded quotes escaped.
fn quote(value: &str) -> String { format!("'{}'", value.replace('\'', "''")) }

pub(crate) fn doc_predicate(doc_id: &str) -> String { format!("doc_id = {}", quote(doc_id)) }
