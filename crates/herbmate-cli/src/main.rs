//! herbmate CLI
//!
//! Command-line client for the herbmate daemon.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// herbmate - classify images with the herbmate daemon
#[derive(Parser, Debug)]
#[command(name = "herbmate")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Daemon API address
    #[arg(long, default_value = "http://localhost:8080", global = true)]
    api: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify an image
    Predict {
        /// Image file to upload
        image: PathBuf,

        /// Number of top scores to print
        #[arg(long, default_value_t = 5)]
        top: usize,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Show daemon and model health
    Health,

    /// Download the model artifact into the local cache
    Fetch {
        /// Path to a TOML configuration file
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let client = commands::ApiClient::new(&cli.api);

    match cli.command {
        Commands::Predict { image, top, json } => {
            commands::predict(&client, image, top, json).await?;
        }
        Commands::Health => {
            commands::health(&client).await?;
        }
        Commands::Fetch { config } => {
            commands::fetch(config).await?;
        }
    }

    Ok(())
}
