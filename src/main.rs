//! Newsdigest CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "newsdigest")]
#[command(about = "News fetching and AI enrichment (summary, sentiment, bias)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file (defaults to ./newsdigest.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the offline heuristic provider instead of the hosted API
    #[arg(long)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a single text read from a file or stdin
    Enrich {
        /// File to read (stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Fetch articles from the news feed
    Fetch {
        /// Search query
        #[arg(short, long)]
        query: Option<String>,

        /// Number of articles to fetch
        #[arg(short, long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=100))]
        limit: u32,

        /// Search all sources instead of top headlines
        #[arg(long)]
        everything: bool,

        /// Enrich each fetched article
        #[arg(short, long)]
        enrich: bool,

        /// Articles enriched in parallel
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "newsdigest={log_level},newsdigest_ai={log_level},newsdigest_feed={log_level}"
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let options = commands::Options {
        config: commands::resolve_config_path(cli.config),
        offline: cli.offline,
    };

    match cli.command {
        Commands::Enrich { file } => commands::enrich(&options, file).await,
        Commands::Fetch {
            query,
            limit,
            everything,
            enrich,
            concurrency,
        } => {
            let request = commands::FetchRequest {
                query,
                limit,
                everything,
                enrich,
                concurrency,
            };
            commands::fetch(&options, request).await
        }
        Commands::Version => {
            println!("Newsdigest v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
