//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Error bodies are plain text. Everything the caller can fix is a 400.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),

  #[error("invalid timezone: {0}")]
  InvalidTimezone(String),

  /// The engine refused the payload (inconsistent rollback, bad weights, …).
  #[error("{0}")]
  Engine(#[from] tempo_core::Error),

  /// Invalid gateway configuration; only raised while building the state.
  #[error("configuration error: {0}")]
  Config(String),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::BadRequest(_)
      | ApiError::InvalidTimezone(_)
      | ApiError::Engine(_) => StatusCode::BAD_REQUEST,
      ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    } else {
      tracing::debug!(error = %self, "request rejected");
    }
    (status, self.to_string()).into_response()
  }
}
