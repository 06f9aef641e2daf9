//! Scheduling parameters supplied by the caller on every request.
//!
//! Every omitted field takes the engine default. Parameters are validated,
//! and FSRS-4.5 weight vectors migrated, by [`Parameters::checked`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// FSRS-5 default weights.
pub const DEFAULT_WEIGHTS: [f64; 19] = [
  0.40255, 1.18385, 3.173, 15.69105, 7.1949, 0.5345, 1.4604, 0.0046, 1.54575,
  0.1192, 1.01925, 1.9395, 0.11, 0.29605, 2.2698, 0.2315, 2.9898, 0.51655,
  0.6621,
];

pub const DEFAULT_REQUEST_RETENTION: f64 = 0.9;
pub const DEFAULT_MAXIMUM_INTERVAL: u32 = 36500;

const LEGACY_WEIGHT_COUNT: usize = 17;

// ─── Learning steps ──────────────────────────────────────────────────────────

/// One rung of a (re)learning ladder, written `<n>m`, `<n>h` or `<n>d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Step {
  minutes: u32,
}

impl Step {
  pub fn from_minutes(minutes: u32) -> Self { Self { minutes } }

  pub fn minutes(self) -> u32 { self.minutes }
}

impl FromStr for Step {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let trimmed = s.trim();
    let invalid = || Error::InvalidStep(s.to_string());
    let split = trimmed.len().checked_sub(1).ok_or_else(invalid)?;
    if !trimmed.is_char_boundary(split) {
      return Err(invalid());
    }
    let (count, unit) = trimmed.split_at(split);
    let count: u32 = count.parse().map_err(|_| invalid())?;
    let per_unit = match unit {
      "m" => 1,
      "h" => 60,
      "d" => 1440,
      _ => return Err(invalid()),
    };
    count
      .checked_mul(per_unit)
      .filter(|m| *m > 0)
      .map(Self::from_minutes)
      .ok_or_else(invalid)
  }
}

impl TryFrom<String> for Step {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<Step> for String {
  fn from(s: Step) -> Self { s.to_string() }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.minutes {
      m if m % 1440 == 0 => write!(f, "{}d", m / 1440),
      m if m % 60 == 0 => write!(f, "{}h", m / 60),
      m => write!(f, "{m}m"),
    }
  }
}

// ─── Parameters ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
  /// Target probability of recall at the due date.
  pub request_retention: f64,
  /// Upper bound on scheduled intervals, in days.
  pub maximum_interval:  u32,
  pub w:                 Vec<f64>,
  pub enable_fuzz:       bool,
  /// Use the step ladder for (re)learning cards instead of whole-day
  /// intervals.
  pub enable_short_term: bool,
  pub learning_steps:    Vec<Step>,
  pub relearning_steps:  Vec<Step>,
}

impl Default for Parameters {
  fn default() -> Self {
    Self {
      request_retention: DEFAULT_REQUEST_RETENTION,
      maximum_interval:  DEFAULT_MAXIMUM_INTERVAL,
      w:                 DEFAULT_WEIGHTS.to_vec(),
      enable_fuzz:       false,
      enable_short_term: true,
      learning_steps:    vec![Step::from_minutes(1), Step::from_minutes(10)],
      relearning_steps:  vec![Step::from_minutes(10)],
    }
  }
}

impl Parameters {
  /// Validate the parameters, migrating a 17-weight FSRS-4.5 vector to the
  /// 19-weight FSRS-5 layout.
  pub fn checked(mut self) -> Result<Self> {
    if !(self.request_retention > 0.0 && self.request_retention < 1.0) {
      return Err(Error::InvalidParameter {
        name:   "request_retention",
        reason: format!("{} is not within (0, 1)", self.request_retention),
      });
    }
    if !(1..=DEFAULT_MAXIMUM_INTERVAL).contains(&self.maximum_interval) {
      return Err(Error::InvalidParameter {
        name:   "maximum_interval",
        reason: format!(
          "{} is not within 1..={DEFAULT_MAXIMUM_INTERVAL} days",
          self.maximum_interval
        ),
      });
    }
    if let Some(bad) = self.w.iter().find(|w| !w.is_finite()) {
      return Err(Error::InvalidParameter {
        name:   "w",
        reason: format!("{bad} is not a finite weight"),
      });
    }
    self.w = match self.w.len() {
      LEGACY_WEIGHT_COUNT => migrate_weights(&self.w),
      n if n == DEFAULT_WEIGHTS.len() => self.w,
      n => return Err(Error::WeightCount(n)),
    };
    Ok(self)
  }
}

/// FSRS-4.5 → FSRS-5: the initial-difficulty terms changed shape and two
/// short-term weights were appended.
fn migrate_weights(w: &[f64]) -> Vec<f64> {
  let mut out = w.to_vec();
  out[4] = round8(w[5] * 2.0 + w[4]);
  out[5] = round8((w[5] * 3.0 + 1.0).ln() / 3.0);
  out[6] = round8(w[6] + 0.5);
  out.extend([0.0, 0.0]);
  out
}

fn round8(v: f64) -> f64 { (v * 1e8).round() / 1e8 }
