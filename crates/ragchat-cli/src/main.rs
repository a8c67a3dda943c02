//! RagChat CLI
//!
//! Command-line interface for crawling a forum and chatting about it.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ragchat_core::Settings;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(author, version, about = "Ask questions about a crawled forum", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database path (defaults to RAGCHAT_DATABASE or .ragchat/index.db)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a site and store its content
    Crawl {
        /// Start URL (defaults to TARGET_URL)
        #[arg(short, long)]
        url: Option<String>,

        /// Maximum pages to visit (defaults to RAGCHAT_MAX_PAGES)
        #[arg(short, long)]
        max_pages: Option<usize>,
    },

    /// Start an interactive chat
    Chat,

    /// Ask a single question
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Search stored content
    Search {
        /// Search query
        query: String,

        /// Maximum results
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Minimum similarity threshold
        #[arg(short, long, default_value = "0.0")]
        threshold: f32,
    },

    /// Show corpus statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "ragchat=debug" } else { "ragchat=info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = Settings::from_env()?;
    if let Some(database) = cli.database {
        settings.database = database;
    }

    match cli.command {
        Commands::Crawl { url, max_pages } => {
            commands::crawl::run(&settings, url, max_pages).await?;
        }
        Commands::Chat => {
            commands::chat::run(&settings).await?;
        }
        Commands::Ask { question } => {
            commands::ask::run(&settings, question.join(" ")).await?;
        }
        Commands::Search {
            query,
            limit,
            threshold,
        } => {
            commands::search::run(&settings, query, limit, threshold).await?;
        }
        Commands::Stats => {
            commands::stats::run(&settings).await?;
        }
    }

    Ok(())
}
