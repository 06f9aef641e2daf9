//! Handlers for `/scheduler`.
//!
//! | Method   | Path         | Notes |
//! |----------|--------------|-------|
//! | `POST`   | `/scheduler` | Body `{data: Card}`. `?grade=` picks one outcome, otherwise all four |
//! | `PUT`    | `/scheduler` | Body `{data: {card, log}}`; undoes the review `log` describes |
//! | `DELETE` | `/scheduler` | Body `{data: Card}`; `?reset_count` clears the counters too |

use axum::{body::Bytes, extract::State, http::StatusCode, response::Response};
use tempo_core::{Card, Grade, RecordLogItem};

use super::{engine, respond};
use crate::{
  AppState,
  annotate::Annotate,
  codec::{Payload, decode},
  context::{RequestContext, flag},
  error::ApiError,
};

// ─── Advance ─────────────────────────────────────────────────────────────────

/// `POST /scheduler[?grade=<grade>]`
pub async fn advance(
  State(state): State<AppState>,
  ctx: RequestContext,
  body: Bytes,
) -> Result<Response, ApiError> {
  let grade = ctx
    .params
    .grade
    .as_deref()
    .map(str::trim)
    .filter(|g| !g.is_empty())
    .map(|g| {
      g.parse::<Grade>()
        .map_err(|_| ApiError::BadRequest(format!("invalid grade: {g}")))
    })
    .transpose()?;

  let Payload { data: card, parameters } = decode::<Card>(&body, "card")?;
  let fsrs = engine(parameters)?;
  let annotator = ctx.annotator();

  let resp = match grade {
    Some(grade) => {
      tracing::debug!(%grade, "next");
      let item = fsrs.next(&card, ctx.now.at, grade);
      respond(StatusCode::OK, &state, &ctx, item.annotate(&annotator))
    }
    None => {
      tracing::debug!("repeat");
      let log = fsrs.repeat(&card, ctx.now.at);
      respond(StatusCode::OK, &state, &ctx, log.annotate(&annotator))
    }
  };
  Ok(resp)
}

// ─── Rollback ────────────────────────────────────────────────────────────────

/// `PUT /scheduler`
pub async fn rollback(
  State(state): State<AppState>,
  ctx: RequestContext,
  body: Bytes,
) -> Result<Response, ApiError> {
  let Payload { data: item, parameters } =
    decode::<RecordLogItem>(&body, "record log item")?;
  let fsrs = engine(parameters)?;
  let card = fsrs.rollback(&item.card, &item.log)?;
  Ok(respond(StatusCode::OK, &state, &ctx, card.annotate(&ctx.annotator())))
}

// ─── Forget ──────────────────────────────────────────────────────────────────

/// `DELETE /scheduler[?reset_count=true]`
pub async fn forget(
  State(state): State<AppState>,
  ctx: RequestContext,
  body: Bytes,
) -> Result<Response, ApiError> {
  let reset_count = flag(ctx.params.reset_count.as_deref());
  let Payload { data: card, parameters } = decode::<Card>(&body, "card")?;
  let fsrs = engine(parameters)?;
  tracing::debug!(reset_count, "forget");
  let item = fsrs.forget(&card, ctx.now.at, reset_count);
  Ok(respond(StatusCode::OK, &state, &ctx, item.annotate(&ctx.annotator())))
}
