//! localrag-hybrid
//!
//! Hybrid retrieval and the two orchestrators:
//! - `fusion`: concatenate-with-dedup-boost join of the vector and keyword branches
//! - `context`: prompt templates and the budgeted context assembler
//! - `pipeline`: the static stage graphs
//! - `ingest` / `query`: orchestrators over the collaborator traits
//! - `session`: append-only chat transcript
//! - `services`: store, embedder and generator handles built from settings

pub mod context;
pub mod fusion;
pub mod ingest;
pub mod pipeline;
pub mod query;
pub mod services;
pub mod session;

pub use context::{assemble, ContextAssembler, PromptTemplate};
pub use fusion::fuse;
pub use ingest::{IngestPipeline, IngestReport};
pub use query::{Answer, QueryPipeline};
pub use services::Services;
pub use session::ChatSession;
