//! `GET /`: what is being served and with which defaults.

use axum::Json;
use serde::Serialize;
use tempo_core::{ENGINE_NAME, FSRS_VERSION, Parameters};

#[derive(Debug, Serialize)]
pub struct Index {
  pub name:       &'static str,
  pub version:    &'static str,
  pub engine:     &'static str,
  pub fsrs:       &'static str,
  pub parameters: Parameters,
}

/// `GET /`
pub async fn handler() -> Json<Index> {
  Json(Index {
    name:       env!("CARGO_PKG_NAME"),
    version:    env!("CARGO_PKG_VERSION"),
    engine:     ENGINE_NAME,
    fsrs:       FSRS_VERSION,
    parameters: Parameters::default(),
  })
}
