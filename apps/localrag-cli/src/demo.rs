//! In-memory hybrid demo over a five-sentence profile.

use anyhow::{Context, Result};

use localrag_core::config::{KeywordBackend, Settings, VectorBackend};
use localrag_core::types::{Document, Meta, META_FILE_NAME};
use localrag_hybrid::context::HYBRID_TEMPLATE;
use localrag_hybrid::Services;

use crate::output::print_answer;

/// Needs the keyword branch for the id and the vector branch for the skills.
pub const DEMO_QUESTION: &str = "What is the candidate's reference ID and what does he specialize in?";

pub const PROFILE: [&str; 5] = [
    "My name is Alex, and I am an AI Engineer looking for opportunities in Germany.",
    "I specialize in Python, Haystack 2.x, and building RAG pipelines.",
    "I have strong knowledge of GDPR data privacy and local model deployment.",
    "I am currently based in Berlin and available to start immediately.",
    "My GitHub handle is AlexCoder99 and my reference ID is REF-2024-DE.",
];

fn demo_settings(mut settings: Settings) -> Settings {
    settings.vector_store.backend = VectorBackend::Memory;
    settings.keyword_store.backend = KeywordBackend::Memory;
    settings.prompt.template = Some(HYBRID_TEMPLATE.to_string());
    settings
}

pub async fn run(settings: Settings, question: &str) -> Result<()> {
    let services = Services::from_settings(demo_settings(settings)).await.context("failed to build demo services")?;
    println!("1. Indexing documents...");
    let ingest = services.ingest_pipeline()?;
    for (i, text) in PROFILE.iter().enumerate() {
        let mut meta = Meta::new();
        meta.insert(META_FILE_NAME.to_string(), format!("profile#{}", i + 1));
        ingest.ingest_document(Document::new(*text, meta)).await.context("demo indexing failed")?;
    }
    println!("   Done! {} documents indexed.", PROFILE.len());
    println!("\n2. Processing hybrid question: '{question}'...");
    let answer = services.query_pipeline()?.answer(question).await.context("demo question failed")?;
    println!("\n=== AI Response ===");
    print_answer(&answer);
    Ok(())
}
