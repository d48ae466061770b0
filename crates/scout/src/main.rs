//! Scout - An iterative deep-research agent

use clap::{Parser, Subcommand};
use tracing::error;

mod commands;

use commands::{init_command, research_command, status_command};

/// Scout - deep research from your terminal
#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "An iterative deep-research agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config and data directory
    Init,
    /// Research a question
    Research {
        /// The question to research
        question: String,
        /// Override the reflection-loop cap
        #[arg(long)]
        loops: Option<u32>,
        /// Override the initial query fan-out
        #[arg(long)]
        queries: Option<u32>,
        /// Override the per-query result limit
        #[arg(long)]
        results: Option<u32>,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show configuration status
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Raise the log filter when researching verbosely
    if matches!(cli.command, Commands::Research { verbose: true, .. }) {
        tracing_subscriber::fmt().with_env_filter("debug").init();
    } else {
        tracing_subscriber::fmt::init();
    }

    match cli.command {
        Commands::Init => {
            if let Err(e) = init_command().await {
                error!("Init failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Research {
            question,
            loops,
            queries,
            results,
            verbose: _,
        } => {
            if let Err(e) = research_command(question, loops, queries, results).await {
                error!("Research failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Status => {
            if let Err(e) = status_command().await {
                error!("Status failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}
