use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

pub const VECTOR_COLUMN: &str = "vector";

pub fn vector_type(dim: i32) -> DataType {
	DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim)
}

pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("doc_id", DataType::Utf8, false),
		Field::new("ordinal", DataType::Int32, false),
		Field::new("content", DataType::Utf8, false),
		Field::new("meta", DataType::Utf8, false),
		Field::new("indexed_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
		Field::new(VECTOR_COLUMN, vector_type(dim), true),
	]))
}

/// Width of the vector column, if the schema has one.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
	match schema.field_with_name(VECTOR_COLUMN).ok()?.data_type() {
		DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vector_dim_reads_fixed_size_list_width() {
		assert_eq!(vector_dim(&build_arrow_schema(768)), Some(768));
		let no_vec = Schema::new(vec![Field::new("id", DataType::Utf8, false)]);
		assert_eq!(vector_dim(&no_vec), None);
	}
}
