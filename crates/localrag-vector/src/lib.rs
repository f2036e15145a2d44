//! localrag-vector
//!
//! Vector store implementations: a LanceDB table searched by cosine distance
//! and an in-memory store with the same contract.

pub mod memory;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use memory::MemoryVectorStore;
pub use writer::LanceVectorStore;
