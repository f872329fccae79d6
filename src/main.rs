//! Ack demonstration server.
//!
//! ```text
//!     Client Request
//!     ───────────────▶ axum router ──▶ AxumContext ──▶ Acknowledger
//!                                                        │
//!                                     X-Ack-* headers ◀──┤──▶ metrics registry
//!     Client Response                                    │        │
//!     ◀─────────────── JSON envelope ◀───────────────────┘        ▼
//!                                                          GET /metrics
//! ```
//!
//! Routes: `GET /test`, `POST /echo`, `GET /metrics`; anything else is a
//! `NotFound` error ack.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use ack::config::loader::resolve_config;
use ack::config::validation::validate_config;
use ack::config::ConfigError;
use ack::observability::logging::init_logging;
use ack::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "ack-server")]
#[command(about = "Demonstration service answering every request with an ack", long_about = None)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the log level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = resolve_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(level) = args.log_level {
        config.observability.log_level = level;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.observability.log_level);
    tracing::info!("ack-server v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_bytes = config.limits.max_body_bytes,
        request_timeout_secs = config.limits.request_timeout_secs,
        metrics_enabled = config.observability.metrics_enabled,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
