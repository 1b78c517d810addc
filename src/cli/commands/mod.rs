//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific
//! modules.

mod init;
mod research;
mod serve;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "inquiry")]
#[command(about = "Research pipeline orchestration service")]
#[command(version)]
pub struct Cli {
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
    /// Initialize the database (create tables / apply migrations)
    Init,

    /// Start the HTTP API server
    Serve {
        /// Bind address: a port ("8000"), a host ("0.0.0.0"), or both
        /// ("0.0.0.0:8000"). Defaults to 127.0.0.1 and the configured port.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Create a research run and execute the pipeline from the terminal
    Run {
        /// The research question
        query: String,

        /// Execution mode: "dummy" or "real"
        #[arg(long, default_value = "dummy")]
        mode: String,

        /// Optional run title
        #[arg(long)]
        title: Option<String>,
    },
}

/// Parse arguments and dispatch to the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::default();

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Serve { bind } => serve::cmd_serve(&settings, bind.as_deref()).await,
        Commands::Run { query, mode, title } => {
            research::cmd_run(&settings, &query, &mode, title).await
        }
    }
}
