//! `POST /rescheduler`: replay a review history under the request's
//! parameters.
//!
//! With a `card_id` the fuzz seed is derived from it, so replaying the same
//! history twice yields identical output.

use axum::{body::Bytes, extract::State, http::StatusCode, response::Response};
use serde::Deserialize;
use tempo_core::{Card, CardIdSeed, HistoryEntry, RescheduleOptions};

use super::{engine, respond};
use crate::{
  AppState,
  annotate::Annotate,
  codec::{Payload, decode},
  context::{RequestContext, flag},
  error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct RescheduleBody {
  pub current_card: Card,
  #[serde(default)]
  pub first_card:   Option<Card>,
  #[serde(default)]
  pub history:      Vec<HistoryEntry>,
}

/// `POST /rescheduler[?skip_manual][&memory_state]`
pub async fn handler(
  State(state): State<AppState>,
  ctx: RequestContext,
  body: Bytes,
) -> Result<Response, ApiError> {
  let Payload { data, parameters } = decode::<RescheduleBody>(&body, "data")?;

  let mut fsrs = engine(parameters)?;
  if let Some(card_id) = ctx.card_id() {
    fsrs = fsrs.with_strategy(CardIdSeed::new(card_id));
  }

  let options = RescheduleOptions {
    skip_manual: flag(ctx.params.skip_manual.as_deref()),
    update_memory_state: flag(ctx.params.memory_state.as_deref()),
    first_card: data.first_card,
    ..RescheduleOptions::new(ctx.now.at)
  };
  tracing::debug!(
    entries = data.history.len(),
    skip_manual = options.skip_manual,
    update_memory_state = options.update_memory_state,
    "reschedule"
  );

  let result = fsrs.reschedule(&data.current_card, &data.history, &options)?;
  Ok(respond(StatusCode::OK, &state, &ctx, result.annotate(&ctx.annotator())))
}
