pub mod cards;
pub mod index;
pub mod rescheduler;
pub mod retrievability;
pub mod scheduler;

use axum::{
  Json,
  http::{HeaderName, HeaderValue, StatusCode},
  response::{IntoResponse, Response},
};
use serde::Serialize;
use tempo_core::{Fsrs, Parameters};

use crate::{AppState, context::RequestContext, error::ApiError};

pub(crate) const NOW_HEADER: HeaderName = HeaderName::from_static("x-now");
pub(crate) const REGION_HEADER: HeaderName = HeaderName::from_static("x-region");
pub(crate) const TIMEZONE_HEADER: HeaderName =
  HeaderName::from_static(crate::context::TIMEZONE_HEADER);

/// JSON `body` with the timing headers every operation returns.
pub(super) fn respond(
  status: StatusCode,
  state: &AppState,
  ctx: &RequestContext,
  body: impl Serialize,
) -> Response {
  let mut resp = (status, Json(body)).into_response();
  let headers = resp.headers_mut();
  headers.insert(TIMEZONE_HEADER, HeaderValue::from_static(ctx.timezone.name()));
  headers.insert(NOW_HEADER, HeaderValue::from(ctx.now.millis()));
  if let Some(region) = &state.region {
    headers.insert(REGION_HEADER, region.clone());
  }
  resp
}

/// Engine for one request's parameters.
pub(super) fn engine(parameters: Parameters) -> Result<Fsrs, ApiError> {
  let fsrs = Fsrs::new(parameters)?;
  tracing::debug!(parameters = ?fsrs.parameters(), "engine ready");
  Ok(fsrs)
}
