//! HTTP gateway for the Tempo scheduling engine.
//!
//! Exposes an axum [`Router`] over the stateless operations of
//! [`tempo_core::Fsrs`]. Every request carries its own card and parameters;
//! nothing is stored between requests. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tempo_api::api_router(state))
//! ```

pub mod annotate;
pub mod codec;
pub mod context;
pub mod error;
pub mod handlers;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  http::HeaderValue,
  routing::{get, post},
};
use chrono_tz::Tz;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

use handlers::{cards, index, rescheduler, retrievability, scheduler};

/// Largest request body accepted, in bytes.
pub const BODY_LIMIT: usize = 1024 * 1024;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Gateway settings, usually flattened into the server's configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
  /// IANA zone used when a request has no `x-timezone` header. Falls back to
  /// the process's zone, then UTC.
  #[serde(default)]
  pub default_timezone: Option<String>,
  /// Echoed as `x-region` on every operation response.
  #[serde(default)]
  pub region:           Option<String>,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Immutable state shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
  pub timezone: Tz,
  pub region:   Option<HeaderValue>,
}

impl AppState {
  pub fn new(config: &GatewayConfig) -> Result<Self, ApiError> {
    let timezone = match config.default_timezone.as_deref().map(str::trim) {
      Some(name) if !name.is_empty() => name.parse::<Tz>().map_err(|_| {
        ApiError::Config(format!("unknown default_timezone {name:?}"))
      })?,
      _ => context::local_timezone(),
    };
    let region = config
      .region
      .as_deref()
      .filter(|r| !r.is_empty())
      .map(|r| {
        HeaderValue::from_str(r)
          .map_err(|_| ApiError::Config(format!("region {r:?} is not a valid header value")))
      })
      .transpose()?;
    tracing::info!(timezone = timezone.name(), region = ?config.region, "gateway configured");
    Ok(Self { timezone, region })
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router(state: AppState) -> Router<()> {
  Router::new()
    .route("/", get(index::handler))
    .route("/cards", post(cards::create))
    .route(
      "/scheduler",
      post(scheduler::advance)
        .put(scheduler::rollback)
        .delete(scheduler::forget),
    )
    .route("/rescheduler", post(rescheduler::handler))
    .route("/retrievability", post(retrievability::handler))
    .layer(DefaultBodyLimit::max(BODY_LIMIT))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
