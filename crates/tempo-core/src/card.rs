//! Card, review log and rating types: the scheduling data model.
//!
//! A card is owned by the caller. Every operation receives the full prior
//! card and returns the full next card; review logs are immutable snapshots
//! of the card as it was immediately before a review.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, time::instant};

// ─── Wire representation ─────────────────────────────────────────────────────

/// `state` and `rating` travel as numbers but are also accepted by name.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrName {
  Num(u8),
  Name(String),
}

// ─── State ───────────────────────────────────────────────────────────────────

/// Learning phase of a card.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize,
  Deserialize,
)]
#[serde(into = "u8", try_from = "NumOrName")]
pub enum State {
  #[default]
  New        = 0,
  Learning   = 1,
  Review     = 2,
  Relearning = 3,
}

impl State {
  pub fn name(self) -> &'static str {
    match self {
      Self::New => "New",
      Self::Learning => "Learning",
      Self::Review => "Review",
      Self::Relearning => "Relearning",
    }
  }
}

impl From<State> for u8 {
  fn from(s: State) -> Self { s as u8 }
}

impl TryFrom<u8> for State {
  type Error = Error;

  fn try_from(v: u8) -> Result<Self, Error> {
    match v {
      0 => Ok(Self::New),
      1 => Ok(Self::Learning),
      2 => Ok(Self::Review),
      3 => Ok(Self::Relearning),
      _ => Err(Error::UnknownState(v.to_string())),
    }
  }
}

impl FromStr for State {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Error> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u8>() {
      return Self::try_from(n);
    }
    [Self::New, Self::Learning, Self::Review, Self::Relearning]
      .into_iter()
      .find(|st| st.name().eq_ignore_ascii_case(s))
      .ok_or_else(|| Error::UnknownState(s.to_string()))
  }
}

impl TryFrom<NumOrName> for State {
  type Error = Error;

  fn try_from(v: NumOrName) -> Result<Self, Error> {
    match v {
      NumOrName::Num(n) => Self::try_from(n),
      NumOrName::Name(s) => s.parse(),
    }
  }
}

impl fmt::Display for State {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

// ─── Rating / Grade ──────────────────────────────────────────────────────────

/// Any rating a review log can carry. `Manual` marks transitions that were
/// not produced by grading (forget, manual reschedule entries).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(into = "u8", try_from = "NumOrName")]
pub enum Rating {
  Manual = 0,
  Again  = 1,
  Hard   = 2,
  Good   = 3,
  Easy   = 4,
}

impl Rating {
  pub fn name(self) -> &'static str {
    match self {
      Self::Manual => "Manual",
      Self::Again => "Again",
      Self::Hard => "Hard",
      Self::Good => "Good",
      Self::Easy => "Easy",
    }
  }
}

impl From<Rating> for u8 {
  fn from(r: Rating) -> Self { r as u8 }
}

impl TryFrom<u8> for Rating {
  type Error = Error;

  fn try_from(v: u8) -> Result<Self, Error> {
    match v {
      0 => Ok(Self::Manual),
      1 => Ok(Self::Again),
      2 => Ok(Self::Hard),
      3 => Ok(Self::Good),
      4 => Ok(Self::Easy),
      _ => Err(Error::UnknownRating(v.to_string())),
    }
  }
}

impl FromStr for Rating {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Error> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u8>() {
      return Self::try_from(n);
    }
    [Self::Manual, Self::Again, Self::Hard, Self::Good, Self::Easy]
      .into_iter()
      .find(|r| r.name().eq_ignore_ascii_case(s))
      .ok_or_else(|| Error::UnknownRating(s.to_string()))
  }
}

impl TryFrom<NumOrName> for Rating {
  type Error = Error;

  fn try_from(v: NumOrName) -> Result<Self, Error> {
    match v {
      NumOrName::Num(n) => Self::try_from(n),
      NumOrName::Name(s) => s.parse(),
    }
  }
}

impl fmt::Display for Rating {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// A rating a reviewer can actually choose.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(into = "u8", try_from = "NumOrName")]
pub enum Grade {
  Again = 1,
  Hard  = 2,
  Good  = 3,
  Easy  = 4,
}

impl Grade {
  pub const ALL: [Grade; 4] = [Self::Again, Self::Hard, Self::Good, Self::Easy];

  /// Numeric value used by the FSRS formulas (1..=4).
  pub fn value(self) -> f64 { f64::from(self as u8) }
}

impl From<Grade> for Rating {
  fn from(g: Grade) -> Self {
    match g {
      Grade::Again => Rating::Again,
      Grade::Hard => Rating::Hard,
      Grade::Good => Rating::Good,
      Grade::Easy => Rating::Easy,
    }
  }
}

impl From<Grade> for u8 {
  fn from(g: Grade) -> Self { g as u8 }
}

impl TryFrom<Rating> for Grade {
  type Error = Error;

  fn try_from(r: Rating) -> Result<Self, Error> {
    match r {
      Rating::Manual => Err(Error::ManualGrade),
      Rating::Again => Ok(Self::Again),
      Rating::Hard => Ok(Self::Hard),
      Rating::Good => Ok(Self::Good),
      Rating::Easy => Ok(Self::Easy),
    }
  }
}

impl FromStr for Grade {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Error> { s.parse::<Rating>()?.try_into() }
}

impl TryFrom<NumOrName> for Grade {
  type Error = Error;

  fn try_from(v: NumOrName) -> Result<Self, Error> {
    Rating::try_from(v)?.try_into()
  }
}

impl fmt::Display for Grade {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    Rating::from(*self).fmt(f)
  }
}

// ─── Card ────────────────────────────────────────────────────────────────────

/// The durable scheduling state for one learnable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
  #[serde(with = "instant")]
  pub due:            DateTime<Utc>,
  /// Days until retrievability decays to the target retention.
  pub stability:      f64,
  /// Intrinsic hardness; 1..=10 once reviewed, 0 while new.
  pub difficulty:     f64,
  pub elapsed_days:   u32,
  pub scheduled_days: u32,
  /// Index into the (re)learning step ladder.
  #[serde(default)]
  pub learning_steps: u32,
  pub reps:           u32,
  pub lapses:         u32,
  pub state:          State,
  #[serde(default, with = "instant::option")]
  pub last_review:    Option<DateTime<Utc>>,
}

impl Card {
  /// A fresh, never-reviewed card due at `now`.
  pub fn new(now: DateTime<Utc>) -> Self {
    Self {
      due:            now,
      stability:      0.0,
      difficulty:     0.0,
      elapsed_days:   0,
      scheduled_days: 0,
      learning_steps: 0,
      reps:           0,
      lapses:         0,
      state:          State::New,
      last_review:    None,
    }
  }
}

// ─── Review log ──────────────────────────────────────────────────────────────

/// An immutable record of one transition.
///
/// Apart from `rating`, `elapsed_days` and `review`, every field is the
/// card's value *before* the transition, which makes rollback exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
  pub rating:            Rating,
  pub state:             State,
  #[serde(with = "instant")]
  pub due:               DateTime<Utc>,
  pub stability:         f64,
  pub difficulty:        f64,
  /// Days since the previous review, measured at `review`.
  pub elapsed_days:      u32,
  pub last_elapsed_days: u32,
  pub scheduled_days:    u32,
  #[serde(default)]
  pub learning_steps:    u32,
  #[serde(default, with = "instant::option")]
  pub last_review:       Option<DateTime<Utc>>,
  #[serde(with = "instant")]
  pub review:            DateTime<Utc>,
}

impl ReviewLog {
  /// Snapshot `card` as the pre-transition state of a log entry.
  pub fn snapshot(
    card: &Card,
    rating: Rating,
    elapsed_days: u32,
    review: DateTime<Utc>,
  ) -> Self {
    Self {
      rating,
      state: card.state,
      due: card.due,
      stability: card.stability,
      difficulty: card.difficulty,
      elapsed_days,
      last_elapsed_days: card.elapsed_days,
      scheduled_days: card.scheduled_days,
      learning_steps: card.learning_steps,
      last_review: card.last_review,
      review,
    }
  }
}

/// One resulting card paired with the log that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordLogItem {
  pub card: Card,
  pub log:  ReviewLog,
}

/// Outcomes for every grade, keyed by grade (serialised as `"1"`..`"4"`).
pub type RecordLog = BTreeMap<Grade, RecordLogItem>;
