//! Request-scoped values: resolved "now", caller timezone, card id and
//! query flags.
//!
//! None of these are scheduling state; they only steer how a single request
//! is computed and rendered.

use axum::{
  extract::{FromRequestParts, Query},
  http::request::Parts,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::{AppState, annotate::Annotator, error::ApiError};

/// Header carrying the caller's IANA timezone, echoed on responses.
pub const TIMEZONE_HEADER: &str = "x-timezone";

// ─── Query ───────────────────────────────────────────────────────────────────

/// Every query parameter any endpoint understands. Flags stay raw strings so
/// that [`flag`] decides what counts as "set".
#[derive(Debug, Default, Deserialize)]
pub struct Params {
  /// Epoch seconds; may be fractional.
  pub now:          Option<String>,
  /// Opaque identifier echoed onto every returned card and log.
  pub card_id:      Option<String>,
  pub grade:        Option<String>,
  pub reset_count:  Option<String>,
  pub skip_manual:  Option<String>,
  pub memory_state: Option<String>,
}

/// Boolean-ish query flag: absent, empty, `0`, `false`, `no` and `off` are
/// false; anything else is true.
pub fn flag(raw: Option<&str>) -> bool {
  match raw.map(str::trim) {
    None | Some("") => false,
    Some(v) => !["0", "false", "no", "off"]
      .iter()
      .any(|f| v.eq_ignore_ascii_case(f)),
  }
}

// ─── Now ─────────────────────────────────────────────────────────────────────

/// The instant a request is computed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedNow {
  pub at:         DateTime<Utc>,
  /// `true` when no usable `now` was supplied and the wall clock was used.
  pub from_clock: bool,
}

impl ResolvedNow {
  pub fn millis(&self) -> i64 { self.at.timestamp_millis() }
}

/// Resolve `raw` (epoch seconds) into a millisecond instant, falling back to
/// `wall_clock` (truncated to millis) for anything absent, non-numeric,
/// non-finite or out of range.
pub fn resolve_now(raw: Option<&str>, wall_clock: DateTime<Utc>) -> ResolvedNow {
  let supplied = raw.map(str::trim).filter(|s| !s.is_empty());
  let parsed = supplied
    .and_then(|s| s.parse::<f64>().ok())
    .filter(|secs| secs.is_finite())
    .and_then(|secs| DateTime::from_timestamp_millis((secs * 1000.0).round() as i64));

  match parsed {
    Some(at) => ResolvedNow { at, from_clock: false },
    None => {
      if let Some(raw) = supplied {
        tracing::warn!(now = raw, "unusable `now` parameter; using wall clock");
      }
      let at = DateTime::from_timestamp_millis(wall_clock.timestamp_millis())
        .unwrap_or(wall_clock);
      ResolvedNow { at, from_clock: true }
    }
  }
}

// ─── Timezone ────────────────────────────────────────────────────────────────

/// The caller's timezone: the header when present and non-empty, otherwise
/// `default`.
pub fn resolve_timezone(header: Option<&str>, default: Tz) -> Result<Tz, ApiError> {
  match header.map(str::trim).filter(|s| !s.is_empty()) {
    None => Ok(default),
    Some(name) => name
      .parse::<Tz>()
      .map_err(|_| ApiError::InvalidTimezone(name.to_string())),
  }
}

/// The process's own IANA zone, or UTC when it cannot be determined.
pub fn local_timezone() -> Tz {
  iana_time_zone::get_timezone()
    .ok()
    .and_then(|name| name.parse().ok())
    .unwrap_or(Tz::UTC)
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// Everything a handler needs from the request line and headers.
#[derive(Debug)]
pub struct RequestContext {
  pub now:      ResolvedNow,
  pub timezone: Tz,
  pub params:   Params,
}

impl RequestContext {
  /// Non-empty card id, if any.
  pub fn card_id(&self) -> Option<&str> {
    self.params.card_id.as_deref().filter(|id| !id.is_empty())
  }

  pub fn annotator(&self) -> Annotator {
    Annotator::new(self.card_id().map(str::to_owned), self.timezone)
  }
}

impl FromRequestParts<AppState> for RequestContext {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState,
  ) -> Result<Self, Self::Rejection> {
    let Query(params) = Query::<Params>::from_request_parts(parts, state)
      .await
      .map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let header = parts
      .headers
      .get(TIMEZONE_HEADER)
      .and_then(|v| v.to_str().ok());
    let timezone = resolve_timezone(header, state.timezone)?;
    let now = resolve_now(params.now.as_deref(), Utc::now());
    tracing::debug!(
      now = now.millis(),
      from_clock = now.from_clock,
      timezone = timezone.name(),
      card_id = ?params.card_id,
      "resolved request context"
    );
    Ok(Self { now, timezone, params })
  }
}
