//! Image API server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace span ─▶ timeout ─▶ router
//!                                                              │
//!                          /api/images/{id}                    │  /health, fallback
//!                     ┌────────────────────────────────────────┘
//!                     ▼
//!               ┌───────────┐    ┌─────────────┐    ┌──────────────┐
//!               │ CORS gate │───▶│ id → path   │───▶│ open + prime │
//!               └───────────┘    └─────────────┘    └──────┬───────┘
//!                                                          │
//!     Client Response                                      ▼
//!     ◀─────────────── 200 image/png, chunked ◀──── file chunks
//!                      400/500 JSON error     ◀──── early failure
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use image_api::config::{self, ServiceConfig};
use image_api::http::HttpServer;
use image_api::lifecycle::Shutdown;
use image_api::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "image-api")]
#[command(about = "Serve PNG images from a directory over HTTP", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long, env = "IMAGE_API_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => {
            let config = ServiceConfig::default();
            config::validate_config(&config).map_err(config::ConfigError::Validation)?;
            config
        }
    };

    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_file = ?args.config,
        bind_address = %config.listener.bind_address,
        image_dir = %config.images.dir.display(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if !config.images.dir.is_dir() {
        tracing::warn!(
            image_dir = %config.images.dir.display(),
            "Image directory does not exist yet; every request will miss"
        );
    }

    if config.observability.metrics_enabled {
        // Validation has already checked the address.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let _signals = shutdown.trigger_on_signal();

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
