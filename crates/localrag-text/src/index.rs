use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use localrag_core::error::{Error, Result};
use localrag_core::traits::{validate_document, KeywordStore};
use localrag_core::types::{IndexedRecord, Meta, ScoredRecord};

use crate::tantivy_utils::{analyze, build_schema, register_tokenizer};

const MIN_WRITER_HEAP: usize = 15_000_000;

#[derive(Clone, Copy)]
struct Fields {
	id: Field,
	doc_id: Field,
	ordinal: Field,
	text: Field,
	meta: Field,
}

struct Inner {
	reader: IndexReader,
	writer: Mutex<IndexWriter>,
	fields: Fields,
}

/// BM25 keyword store on a tantivy index, on disk or in RAM.
///
/// A single writer is held for the lifetime of the store, so concurrent
/// ingestion jobs serialise their commits on it.
#[derive(Clone)]
pub struct TantivyKeywordStore {
	inner: Arc<Inner>,
}

impl TantivyKeywordStore {
	/// Open the index in `index_dir`, creating it when missing.
	pub fn open(index_dir: &Path, writer_heap_bytes: usize) -> Result<Self> {
		std::fs::create_dir_all(index_dir).map_err(Error::index)?;
		let dir = MmapDirectory::open(index_dir).map_err(Error::index)?;
		let index = Index::open_or_create(dir, build_schema()).map_err(Error::index)?;
		tracing::info!(dir = %index_dir.display(), "keyword index opened");
		Self::from_index(index, writer_heap_bytes)
	}

	pub fn in_memory() -> Result<Self> {
		Self::from_index(Index::create_in_ram(build_schema()), MIN_WRITER_HEAP)
	}

	fn from_index(index: Index, writer_heap_bytes: usize) -> Result<Self> {
		register_tokenizer(&index);
		let schema = index.schema();
		let field = |name: &str| schema.get_field(name).map_err(|e| Error::Configuration(format!("keyword index schema: {e}")));
		let fields = Fields { id: field("id")?, doc_id: field("doc_id")?, ordinal: field("ordinal")?, text: field("text")?, meta: field("meta")? };
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(Error::index)?;
		let writer = index.writer_with_num_threads(1, writer_heap_bytes.max(MIN_WRITER_HEAP)).map_err(Error::index)?;
		Ok(Self { inner: Arc::new(Inner { reader, writer: Mutex::new(writer), fields }) })
	}

	/// Run a batch of writer operations and commit, rolling back on failure.
	fn commit_with<F>(&self, ops: F) -> Result<()>
	where
		F: FnOnce(&mut IndexWriter, Fields) -> tantivy::Result<()>,
	{
		let mut writer = self.inner.writer.lock().map_err(|_| Error::index("keyword writer lock poisoned"))?;
		let outcome = ops(&mut *writer, self.inner.fields).and_then(|()| writer.commit().map(|_| ()));
		if let Err(e) = outcome {
			if let Err(rollback) = writer.rollback() {
				tracing::error!(error = %rollback, "keyword writer rollback failed");
			}
			return Err(Error::index(e));
		}
		self.inner.reader.reload().map_err(Error::index)
	}

	/// Add `records` in one commit. With `replaces`, every earlier record of
	/// that document is deleted in the same commit.
	fn write_blocking(&self, records: &[IndexedRecord], replaces: Option<&str>) -> Result<()> {
		let metas = records
			.iter()
			.map(|r| serde_json::to_string(&r.meta).map_err(Error::index))
			.collect::<Result<Vec<_>>>()?;
		self.commit_with(|writer, f| {
			if let Some(doc_id) = replaces {
				writer.delete_term(Term::from_field_text(f.doc_id, doc_id));
			}
			for (r, meta) in records.iter().zip(metas) {
				writer.delete_term(Term::from_field_text(f.id, &r.id));
				writer.add_document(doc!(
					f.id => r.id.clone(),
					f.doc_id => r.doc_id.clone(),
					f.ordinal => r.ordinal as u64,
					f.text => r.text.clone(),
					f.meta => meta,
				))?;
			}
			Ok(())
		})?;
		tracing::debug!(records = records.len(), "keyword records committed");
		Ok(())
	}

	fn query_blocking(&self, text: &str, top_k: usize) -> Result<Vec<ScoredRecord>> {
		let f = self.inner.fields;
		let terms = analyze(text);
		if terms.is_empty() || top_k == 0 { return Ok(Vec::new()); }
		let clauses: Vec<(Occur, Box<dyn Query>)> = terms
			.iter()
			.map(|t| (Occur::Should, Box::new(TermQuery::new(Term::from_field_text(f.text, t), IndexRecordOption::WithFreqs)) as Box<dyn Query>))
			.collect();
		let query = BooleanQuery::new(clauses);
		let searcher = self.inner.reader.searcher();
		let top_docs = searcher.search(&query, &TopDocs::with_limit(top_k)).map_err(Error::index)?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr).map_err(Error::index)?;
			let str_of = |field: Field| doc.get_first(field).and_then(|v| v.as_str()).unwrap_or("").to_string();
			let meta: Meta = serde_json::from_str(&str_of(f.meta)).unwrap_or_default();
			let ordinal = doc.get_first(f.ordinal).and_then(|v| v.as_u64()).unwrap_or(0);
			let record = IndexedRecord {
				id: str_of(f.id),
				doc_id: str_of(f.doc_id),
				ordinal: usize::try_from(ordinal).unwrap_or(usize::MAX),
				text: str_of(f.text),
				vector: None,
				meta,
			};
			hits.push(ScoredRecord { record, score });
		}
		Ok(hits)
	}

	async fn blocking<T, F>(&self, op: F) -> Result<T>
	where
		T: Send + 'static,
		F: FnOnce(TantivyKeywordStore) -> Result<T> + Send + 'static,
	{
		let store = self.clone();
		tokio::task::spawn_blocking(move || op(store)).await.map_err(Error::index)?
	}
}

#[async_trait]
impl KeywordStore for TantivyKeywordStore {
	async fn write(&self, records: &[IndexedRecord]) -> Result<()> {
		if records.is_empty() { return Ok(()); }
		let records = records.to_vec();
		self.blocking(move |s| s.write_blocking(&records, None)).await
	}

	async fn replace_document(&self, doc_id: &str, records: &[IndexedRecord]) -> Result<()> {
		validate_document(records, doc_id)?;
		let (doc_id, records) = (doc_id.to_string(), records.to_vec());
		self.blocking(move |s| s.write_blocking(&records, Some(doc_id.as_str()))).await
	}

	async fn query(&self, text: &str, top_k: usize) -> Result<Vec<ScoredRecord>> {
		let text = text.to_string();
		self.blocking(move |s| s.query_blocking(&text, top_k)).await
	}

	async fn delete_document(&self, doc_id: &str) -> Result<()> {
		let doc_id = doc_id.to_string();
		self.blocking(move |s| s.commit_with(|writer, f| { writer.delete_term(Term::from_field_text(f.doc_id, &doc_id)); Ok(()) })).await
	}

	async fn reset(&self) -> Result<()> {
		self.blocking(|s| s.commit_with(|writer, _| writer.delete_all_documents().map(|_| ()))).await?;
		tracing::info!("keyword index reset");
		Ok(())
	}

	async fn count(&self) -> Result<usize> {
		let n = self.inner.reader.searcher().num_docs();
		usize::try_from(n).map_err(Error::index)
	}
}
