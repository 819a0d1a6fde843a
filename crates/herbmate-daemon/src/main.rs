//! herbmate daemon
//!
//! Resolves and loads the classifier once, then serves predictions over HTTP.
//! A model that cannot be fetched or loaded leaves the server running in a
//! degraded state where `/predict` answers with an error.

use anyhow::Context;
use clap::Parser;
use herbmate_api::create_router;
use herbmate_core::{HerbmateConfig, LoggingConfig};
use herbmate_runtime::{initialize, Classifier, InferencePipeline, ModelHandle, OnnxClassifier};
use herbmate_store::{store_from_config, ArtifactResolver, ModelArtifact};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// herbmated - image classification inference server
#[derive(Parser, Debug)]
#[command(name = "herbmated")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Address to bind the API server
    #[arg(long)]
    address: Option<String>,

    /// Port for the API server
    #[arg(long)]
    port: Option<u16>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> anyhow::Result<HerbmateConfig> {
    let mut config = match &args.config {
        Some(path) => HerbmateConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HerbmateConfig::default(),
    };
    config.apply_env();

    if let Some(address) = &args.address {
        config.api.address = address.clone();
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    Ok(config)
}

fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_lowercase()));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false);

    if config.format.eq_ignore_ascii_case("json") {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Bind the API listener; `address` may be an IPv4/IPv6 literal or a hostname
async fn bind(address: &str, port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind((address, port)).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_logging(&config.logging)?;

    info!("Starting herbmate daemon v{}", env!("CARGO_PKG_VERSION"));

    // Resolve and load exactly once, before accepting traffic
    let model = match store_from_config(&config.store) {
        Ok(store) => {
            let resolver = ArtifactResolver::new(store);
            let artifact = ModelArtifact::from(&config.artifact);
            let runtime_config = config.runtime.clone();
            initialize(&resolver, &artifact, move |path| {
                OnnxClassifier::load(&path, &runtime_config)
                    .map(|c| Arc::new(c) as Arc<dyn Classifier>)
            })
            .await
        }
        Err(e) => {
            error!(error = %e, "Object store could not be configured");
            ModelHandle::unavailable(e.to_string())
        }
    };

    if !model.is_ready() {
        warn!("Model unavailable; serving in degraded mode");
    }

    let router = create_router(InferencePipeline::new(model), config.api.max_upload_bytes);

    let listener = bind(&config.api.address, config.api.port)
        .await
        .with_context(|| format!("failed to bind {}:{}", config.api.address, config.api.port))?;

    info!("API server listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_ipv4_literal() {
        let listener = bind("127.0.0.1", 0).await.unwrap();
        assert!(listener.local_addr().unwrap().is_ipv4());
    }

    #[tokio::test]
    async fn test_bind_hostname() {
        let listener = bind("localhost", 0).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[tokio::test]
    async fn test_bind_rejects_unresolvable_host() {
        assert!(bind("no such host", 0).await.is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from(["herbmated", "--address", "::", "--port", "9000"]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.api.address, "::");
        assert_eq!(config.api.port, 9000);
    }
}
