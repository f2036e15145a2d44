//! Interactive question loop.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use localrag_core::sources::collect_sources;
use localrag_core::traits::Converter;
use localrag_hybrid::{ChatSession, Services};

use crate::output::print_answer;

enum Input<'a> {
    Quit,
    Help,
    History,
    Ingest(&'a str),
    Question(&'a str),
}

fn parse(line: &str) -> Option<Input<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(match line {
        _ if line.eq_ignore_ascii_case("q") => Input::Quit,
        "/quit" | "/q" | "quit" | "exit" => Input::Quit,
        "/help" | "/h" => Input::Help,
        "/history" => Input::History,
        _ => match line.strip_prefix("/ingest") {
            Some(path) => Input::Ingest(path.trim()),
            None => Input::Question(line),
        },
    })
}

fn show_help() {
    println!("Commands:");
    println!("  <question>       - Ask about the indexed papers");
    println!("  /ingest <path>   - Index a file or directory before the next question");
    println!("  /history         - Show this conversation");
    println!("  /help            - Show this help message");
    println!("  q, /quit         - Exit");
}

/// Ingest every source under `path` into the session before the next
/// question is read.
async fn upload(session: &mut ChatSession, converter: &dyn Converter, path: &str) {
    let files = match collect_sources(&[PathBuf::from(path)], converter) {
        Ok(files) => files,
        Err(err) => {
            println!("❌ {err}");
            return;
        }
    };
    if files.is_empty() {
        println!("No PDF or text files found");
        return;
    }
    for file in &files {
        match session.upload(file).await {
            Ok(report) => println!("📄 {}: {} chunk(s)", file.display(), report.chunks),
            Err(err) => println!("❌ {}: {err}", file.display()),
        }
    }
}

pub async fn run(services: &Services) -> Result<()> {
    let ingest = Arc::new(services.ingest_pipeline()?);
    let mut session = ChatSession::new(Arc::new(services.query_pipeline()?), Arc::clone(&ingest));
    println!("📚 {} chunk(s) indexed. Type /help for commands.", services.vector.count().await?);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"\nEnter your question about the paper (or type 'q' to quit): ").await?;
        stdout.flush().await?;
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        match parse(&line) {
            None => continue,
            Some(Input::Quit) => break,
            Some(Input::Help) => show_help(),
            Some(Input::History) => print!("{}", session.render_transcript()),
            Some(Input::Ingest("")) => println!("Usage: /ingest <path>"),
            Some(Input::Ingest(path)) => upload(&mut session, ingest.converter(), path).await,
            Some(Input::Question(question)) => {
                // Ctrl-C drops the in-flight query; nothing is added to the transcript.
                let result = tokio::select! {
                    r = session.ask(question) => Some(r),
                    _ = tokio::signal::ctrl_c() => None,
                };
                match result {
                    Some(Ok(answer)) => print_answer(&answer),
                    Some(Err(err)) => println!("❌ {err}"),
                    None => println!("⏹ cancelled"),
                }
            }
        }
    }
    println!("👋 Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use localrag_core::config::{KeywordBackend, Settings, VectorBackend};

    #[test]
    fn sentinels_and_commands() {
        assert!(matches!(parse("q"), Some(Input::Quit)));
        assert!(matches!(parse(" Q "), Some(Input::Quit)));
        assert!(matches!(parse("/quit"), Some(Input::Quit)));
        assert!(matches!(parse("/history"), Some(Input::History)));
        assert!(matches!(parse("/ingest papers/"), Some(Input::Ingest("papers/"))));
        assert!(matches!(parse("/ingest"), Some(Input::Ingest(""))));
        assert!(matches!(parse("What is the reference ID?"), Some(Input::Question("What is the reference ID?"))));
        assert!(parse("   ").is_none());
    }

    #[tokio::test]
    async fn ingest_command_uploads_each_source_through_the_session() {
        let mut settings = Settings::default();
        settings.embedding.fake = true;
        settings.embedding.dimension = 32;
        settings.vector_store.backend = VectorBackend::Memory;
        settings.keyword_store.backend = KeywordBackend::Memory;
        let services = Services::from_settings(settings).await.expect("services");
        let ingest = Arc::new(services.ingest_pipeline().expect("ingest"));
        let mut session = ChatSession::new(Arc::new(services.query_pipeline().expect("query")), Arc::clone(&ingest));

        let tmp = tempfile::TempDir::new().expect("tmp");
        std::fs::write(tmp.path().join("a.txt"), "Protocol ZX-77 covers cold storage.").expect("write");
        std::fs::write(tmp.path().join("b.md"), "Freezers are checked weekly.").expect("write");
        std::fs::write(tmp.path().join("skip.png"), "not text").expect("write");
        upload(&mut session, ingest.converter(), &tmp.path().to_string_lossy()).await;

        assert_eq!(services.vector.count().await.expect("count"), 2);
        assert_eq!(services.keyword.count().await.expect("count"), 2);
        assert!(session.transcript().is_empty());
    }
}
