//! localrag-text
//!
//! Tantivy-backed keyword store. Records are indexed with a lowercasing,
//! stop-word-filtering analyzer and queried by BM25 over the analyzed terms
//! of the question, so exact tokens such as ids and codes are matched
//! regardless of punctuation in the question.

pub mod index;
pub mod tantivy_utils;

pub use index::TantivyKeywordStore;
