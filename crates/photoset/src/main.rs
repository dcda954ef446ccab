//! Photoset - turn uploaded images into multimodal fine-tuning datasets.
//!
//! Photoset runs an HTTP service that accepts image uploads, asks a
//! vision-capable model (DashScope or any OpenAI-compatible endpoint) to
//! describe each image, and writes the results as JSON Lines training data.
//!
//! # Usage
//!
//! ```bash
//! # Start the service
//! photoset serve --port 8000
//!
//! # Try the full flow without an API key
//! photoset serve --demo
//!
//! # Describe a single image
//! photoset describe cat.jpg --endpoint https://api.openai.com/v1/chat/completions
//!
//! # View configuration
//! photoset config show
//! ```

use clap::{Parser, Subcommand};
use photoset_core::Config;
use std::path::PathBuf;

mod cli;
mod logging;
mod server;

/// Photoset - turn uploaded images into multimodal fine-tuning datasets.
#[derive(Parser, Debug)]
#[command(name = "photoset")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "PHOTOSET_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service
    Serve(cli::serve::ServeArgs),

    /// Describe a single image and print the result
    Describe(cli::describe::DescribeArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load {}: {e}", path.display()))?,
        None => Config::load().unwrap_or_else(|e| {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `photoset config path`."
            );
            Config::default()
        }),
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Photoset v{}", photoset_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Describe(args) => cli::describe::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, cli.config).await,
    }
}
