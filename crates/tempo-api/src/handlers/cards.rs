//! `POST /cards`: a fresh card due now. The body, if any, is ignored.

use axum::{extract::State, http::StatusCode, response::Response};
use tempo_core::Fsrs;

use super::respond;
use crate::{AppState, annotate::Annotate, context::RequestContext};

/// `POST /cards`
pub async fn create(State(state): State<AppState>, ctx: RequestContext) -> Response {
  let card = Fsrs::create_empty_card(ctx.now.at);
  tracing::debug!(card_id = ?ctx.card_id(), "created card");
  respond(StatusCode::CREATED, &state, &ctx, card.annotate(&ctx.annotator()))
}
