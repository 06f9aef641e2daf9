//! Error types for `tempo-core`.
//!
//! Every variant describes an input the engine refuses to schedule; callers
//! treat them as client errors.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot roll back a manual rating")]
  ManualRollback,

  #[error("card has no review to roll back")]
  NothingToRollback,

  #[error(
    "review log at {log} does not match the card's last review ({card:?})"
  )]
  LogMismatch {
    log:  DateTime<Utc>,
    card: Option<DateTime<Utc>>,
  },

  #[error("expected 17 or 19 weights, got {0}")]
  WeightCount(usize),

  #[error("invalid parameter {name}: {reason}")]
  InvalidParameter { name: &'static str, reason: String },

  #[error("invalid learning step {0:?}")]
  InvalidStep(String),

  #[error("unknown rating: {0:?}")]
  UnknownRating(String),

  #[error("unknown card state: {0:?}")]
  UnknownState(String),

  #[error("manual rating is not a grade")]
  ManualGrade,

  #[error("manual history entry at {review} is missing its {field}")]
  IncompleteManualEntry {
    review: DateTime<Utc>,
    field:  &'static str,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
