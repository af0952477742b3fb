//! Vesper CLI — the main entry point.
//!
//! Commands:
//! - `chat`    — Interactive chat with the assistant
//! - `ask`     — Send a single utterance and print the reply
//! - `intent`  — Debug the intent classifier against an utterance
//! - `tools`   — Show tool registry status

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "vesper",
    about = "Vesper — on-device assistant orchestration engine",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant interactively
    Chat,

    /// Send a single utterance
    Ask {
        /// The utterance to process
        #[arg(short, long)]
        message: String,
    },

    /// Show how an utterance classifies
    Intent {
        /// The utterance to classify
        text: String,
    },

    /// Show tool registry status
    Tools,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat => commands::chat::run().await?,
        Commands::Ask { message } => commands::ask::run(&message).await?,
        Commands::Intent { text } => commands::intent::run(&text)?,
        Commands::Tools => commands::tools::run()?,
    }

    Ok(())
}
