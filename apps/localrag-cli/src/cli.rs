use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use localrag_core::config::RetrievalMode;

/// Local retrieval-augmented question answering over your PDFs.
#[derive(Debug, Parser)]
#[command(name = "localrag", version, about)]
pub struct Cli {
    /// Directory holding config.toml / config.<RUST_ENV>.toml.
    #[arg(long, global = true, env = "LOCALRAG_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert, chunk, embed and index PDF or text files (directories are walked).
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Wipe both indexes before ingesting.
        #[arg(long)]
        recreate: bool,
    },
    /// Interactive question loop; `q` or `/quit` exits.
    Ask {
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
    /// Answer one question and exit.
    Query {
        question: String,
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
    /// Show the fused context for a question without generating.
    Search {
        question: String,
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
    /// Remove every record from both indexes.
    Reset,
    /// Index a small profile in memory and ask a question needing both branches.
    Demo {
        #[arg(long, default_value = crate::demo::DEMO_QUESTION)]
        question: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Hybrid,
    Vector,
    Keyword,
}

impl From<ModeArg> for RetrievalMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Hybrid => RetrievalMode::Hybrid,
            ModeArg::Vector => RetrievalMode::Vector,
            ModeArg::Keyword => RetrievalMode::Keyword,
        }
    }
}
