mod cli;
mod demo;
mod output;
mod repl;
mod telemetry;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use localrag_core::config::{Config, Settings};
use localrag_core::sources::collect_sources;
use localrag_hybrid::{IngestPipeline, Services};

use crate::cli::{Cli, Command, ModeArg};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing()?;
    let cli = Cli::parse();
    let settings = load_settings(cli.config_dir.as_deref())?;
    match cli.command {
        Command::Ingest { paths, recreate } => ingest(settings, &paths, recreate).await,
        Command::Ask { mode } => {
            let services = open_services(with_mode(settings, mode)).await?;
            repl::run(&services).await
        }
        Command::Query { question, mode } => {
            let services = open_services(with_mode(settings, mode)).await?;
            let answer = services.query_pipeline()?.answer(&question).await.context("question could not be answered")?;
            output::print_answer(&answer);
            Ok(())
        }
        Command::Search { question, mode } => {
            let services = open_services(with_mode(settings, mode)).await?;
            let context = services.query_pipeline()?.retrieve(&question).await.context("retrieval failed")?;
            output::print_context(&context);
            Ok(())
        }
        Command::Reset => {
            let services = open_services(settings).await?;
            services.reset().await.context("reset failed")?;
            println!("✅ Indexes cleared");
            Ok(())
        }
        Command::Demo { question } => demo::run(settings, &question).await,
    }
}

fn load_settings(dir: Option<&Path>) -> Result<Settings> {
    let config = match dir {
        Some(dir) => Config::load_from(dir),
        None => Config::load(),
    }
    .context("failed to load configuration")?;
    config.settings().context("invalid configuration")
}

fn with_mode(mut settings: Settings, mode: Option<ModeArg>) -> Settings {
    if let Some(mode) = mode {
        settings.retrieval.mode = mode.into();
    }
    settings
}

async fn open_services(settings: Settings) -> Result<Services> {
    tracing::debug!(
        vector = ?settings.vector_store.backend,
        keyword = ?settings.keyword_store.backend,
        mode = ?settings.retrieval.mode,
        "opening services"
    );
    Services::from_settings(settings).await.context("failed to open indexes and services")
}

async fn ingest(mut settings: Settings, paths: &[PathBuf], recreate: bool) -> Result<()> {
    settings.vector_store.recreate |= recreate;
    tracing::debug!(recreate = settings.vector_store.recreate, "opening services for ingestion");
    let services = Services::for_ingest(settings).await.context("failed to open indexes and services")?;
    let pipeline = services.ingest_pipeline()?;
    let failed = ingest_paths(&pipeline, paths).await?;
    if failed > 0 {
        anyhow::bail!("{failed} file(s) could not be ingested");
    }
    Ok(())
}

/// Ingest every source under `paths`, one document at a time. A failing
/// document is reported and skipped. Returns the number of failures.
pub(crate) async fn ingest_paths(pipeline: &IngestPipeline, paths: &[PathBuf]) -> Result<usize> {
    let files = collect_sources(paths, pipeline.converter()).context("cannot collect input files")?;
    if files.is_empty() {
        println!("No PDF or text files found");
        return Ok(0);
    }
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let (mut chunks, mut failed) = (0usize, 0usize);
    for file in &files {
        let name = file.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        pb.set_message(name.clone());
        match pipeline.ingest_file(file).await {
            Ok(report) => chunks += report.chunks,
            Err(err) => {
                failed += 1;
                pb.println(format!("❌ {name}: {err}"));
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");
    println!("📊 Indexed {} file(s), {chunks} chunk(s); {failed} failed", files.len() - failed);
    Ok(failed)
}
