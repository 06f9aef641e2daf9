//! tempo-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), layers
//! `TEMPO_*` environment variables over it, and serves the scheduling API
//! under `/api`.
//!
//! ```toml
//! host             = "0.0.0.0"
//! port             = 8080
//! default_timezone = "Asia/Shanghai"
//! region           = "hkg1"
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use serde::Deserialize;
use tempo_api::{AppState, GatewayConfig};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tempo scheduling gateway")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

/// Runtime server configuration.
#[derive(Debug, Deserialize)]
struct ServerConfig {
  #[serde(default = "default_host")]
  host:    String,
  #[serde(default = "default_port")]
  port:    u16,
  #[serde(flatten)]
  gateway: GatewayConfig,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("TEMPO"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let state = AppState::new(&server_cfg.gateway)
    .context("invalid gateway configuration")?;

  let app = Router::new().nest("/api", tempo_api::api_router(state));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
