//! localrag-llm
//!
//! Answer generators: the Ollama completion client and a scripted
//! in-process generator.

pub mod ollama;
pub mod scripted;

pub use ollama::OllamaGenerator;
pub use scripted::ScriptedGenerator;
