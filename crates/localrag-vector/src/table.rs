//! LanceDB connection and table housekeeping.
use std::path::Path;
use std::sync::Arc;

use arrow_array::RecordBatchIterator;
use lancedb::{connect, Connection, Table};

use localrag_core::error::{Error, Result};

use crate::schema::{build_arrow_schema, vector_dim};

pub async fn open_db(uri: &Path) -> Result<Connection> {
	std::fs::create_dir_all(uri).map_err(Error::index)?;
	connect(uri.to_string_lossy().as_ref()).execute().await.map_err(Error::index)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
	let names = conn.table_names().execute().await.map_err(Error::index)?;
	Ok(names.iter().any(|n| n == name))
}

/// Remove the on-disk dataset of a local table.
pub fn remove_table_dir(uri: &Path, name: &str) -> Result<()> {
	let dir = uri.join(format!("{name}.lance"));
	if dir.exists() {
		std::fs::remove_dir_all(&dir).map_err(Error::index)?;
		tracing::warn!(table = name, dir = %dir.display(), "vector table removed");
	}
	Ok(())
}

/// Open `name`, creating an empty table with a `dim`-wide vector column if
/// missing. An existing table with a different width is a configuration error.
pub async fn ensure_table(conn: &Connection, name: &str, dim: usize) -> Result<Table> {
	let width = i32::try_from(dim).map_err(|_| Error::Configuration(format!("vector dimension {dim} is too large")))?;
	if table_exists(conn, name).await? {
		let table = conn.open_table(name).execute().await.map_err(Error::index)?;
		let schema = table.schema().await.map_err(Error::index)?;
		return match vector_dim(&schema) {
			Some(existing) if existing == dim => Ok(table),
			Some(existing) => Err(Error::Configuration(format!(
				"vector table '{name}' stores {existing}-dim vectors but the embedder produces {dim}; re-create the table"
			))),
			None => Err(Error::Configuration(format!("vector table '{name}' has no vector column"))),
		};
	}
	let schema = build_arrow_schema(width);
	// create empty table with 0 rows
	let iter = RecordBatchIterator::new(vec![].into_iter(), Arc::clone(&schema));
	let table = conn.create_table(name, Box::new(iter)).execute().await.map_err(Error::index)?;
	tracing::info!(table = name, dim, "vector table created");
	Ok(table)
}
