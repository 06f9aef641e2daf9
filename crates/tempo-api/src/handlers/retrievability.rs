//! `POST /retrievability`: recall probability of a card at "now".

use axum::{body::Bytes, extract::State, http::StatusCode, response::Response};
use serde::Serialize;
use tempo_core::{Card, format_retrievability};

use super::{engine, respond};
use crate::{
  AppState,
  codec::{Payload, decode},
  context::RequestContext,
  error::ApiError,
};

#[derive(Debug, Serialize)]
pub struct Retrievability {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub card_id:               Option<String>,
  pub retrievability:        f64,
  pub retrievability_string: String,
  /// Epoch milliseconds the value was computed at.
  pub now:                   i64,
}

/// `POST /retrievability`
pub async fn handler(
  State(state): State<AppState>,
  ctx: RequestContext,
  body: Bytes,
) -> Result<Response, ApiError> {
  let Payload { data: card, parameters } = decode::<Card>(&body, "card")?;
  let fsrs = engine(parameters)?;
  let r = fsrs.retrievability(&card, ctx.now.at);
  let out = Retrievability {
    card_id:               ctx.card_id().map(str::to_owned),
    retrievability:        r,
    retrievability_string: format_retrievability(r),
    now:                   ctx.now.millis(),
  };
  Ok(respond(StatusCode::OK, &state, &ctx, out))
}
