//! Command-line interface.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "licitabot")]
#[command(about = "Analisador de documentos de licitação pública (TR e Edital)")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze local documents and print the full report
    Analyze {
        /// Files to analyze (PDF, DOCX, DOC, TXT, MD, CSV)
        files: Vec<PathBuf>,
    },

    /// Classify local documents without running the full analysis
    Classify {
        /// Files to classify
        files: Vec<PathBuf>,
    },

    /// Start the Slack event server
    Serve {
        /// Address to bind to (HOST:PORT)
        #[arg(default_value = "127.0.0.1:3030")]
        bind: String,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { files } => commands::analyze(settings, &files).await,
        Commands::Classify { files } => commands::classify(settings, &files).await,
        Commands::Serve { bind } => crate::server::serve(settings, &bind).await,
    }
}
