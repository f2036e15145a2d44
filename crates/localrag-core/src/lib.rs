//! localrag-core
//!
//! Domain types, the error taxonomy, traits for every external collaborator
//! (embedder, vector store, keyword store, generator, converter), the figment
//! configuration, and the ingestion-side text processing (cleaner, chunker).

pub mod chunker;
pub mod cleaner;
pub mod config;
pub mod convert;
pub mod error;
pub mod sources;
pub mod traits;
pub mod types;

pub use error::{Error, ErrorKind, Result};
