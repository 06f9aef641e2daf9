//! Output annotation: the last step before serialisation.
//!
//! Engine results are converted into response shapes that carry the
//! request's card id and render every instant as local time in the caller's
//! timezone. Rendering is representational only; the instant itself never
//! changes, and the rendered text decodes back into the same instant.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tempo_core::{
  Card, Grade, Rating, RecordLog, RecordLogItem, RescheduleResult, ReviewLog,
  State,
};

/// Request-bound rendering settings.
#[derive(Debug, Clone)]
pub struct Annotator {
  card_id:  Option<String>,
  timezone: Tz,
}

impl Annotator {
  pub fn new(card_id: Option<String>, timezone: Tz) -> Self {
    Self { card_id, timezone }
  }

  /// `2023-11-14T22:13:20Z` in `Asia/Shanghai` → `2023-11-15T06:13:20+08:00`.
  pub fn local(&self, at: DateTime<Utc>) -> String {
    at.with_timezone(&self.timezone)
      .to_rfc3339_opts(SecondsFormat::AutoSi, false)
  }
}

/// Conversion of one engine output shape into its response shape.
pub trait Annotate {
  type Output: Serialize;

  fn annotate(self, annotator: &Annotator) -> Self::Output;
}

// ─── Card ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedCard {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub card_id:        Option<String>,
  pub due:            String,
  pub stability:      f64,
  pub difficulty:     f64,
  pub elapsed_days:   u32,
  pub scheduled_days: u32,
  pub learning_steps: u32,
  pub reps:           u32,
  pub lapses:         u32,
  pub state:          State,
  pub last_review:    Option<String>,
}

impl Annotate for Card {
  type Output = AnnotatedCard;

  fn annotate(self, a: &Annotator) -> AnnotatedCard {
    AnnotatedCard {
      card_id:        a.card_id.clone(),
      due:            a.local(self.due),
      stability:      self.stability,
      difficulty:     self.difficulty,
      elapsed_days:   self.elapsed_days,
      scheduled_days: self.scheduled_days,
      learning_steps: self.learning_steps,
      reps:           self.reps,
      lapses:         self.lapses,
      state:          self.state,
      last_review:    self.last_review.map(|t| a.local(t)),
    }
  }
}

// ─── Log ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedLog {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub card_id:           Option<String>,
  pub rating:            Rating,
  pub state:             State,
  pub due:               String,
  pub stability:         f64,
  pub difficulty:        f64,
  pub elapsed_days:      u32,
  pub last_elapsed_days: u32,
  pub scheduled_days:    u32,
  pub learning_steps:    u32,
  pub last_review:       Option<String>,
  pub review:            String,
}

impl Annotate for ReviewLog {
  type Output = AnnotatedLog;

  fn annotate(self, a: &Annotator) -> AnnotatedLog {
    AnnotatedLog {
      card_id:           a.card_id.clone(),
      rating:            self.rating,
      state:             self.state,
      due:               a.local(self.due),
      stability:         self.stability,
      difficulty:        self.difficulty,
      elapsed_days:      self.elapsed_days,
      last_elapsed_days: self.last_elapsed_days,
      scheduled_days:    self.scheduled_days,
      learning_steps:    self.learning_steps,
      last_review:       self.last_review.map(|t| a.local(t)),
      review:            a.local(self.review),
    }
  }
}

// ─── Composite shapes ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedItem {
  pub card: AnnotatedCard,
  pub log:  AnnotatedLog,
}

impl Annotate for RecordLogItem {
  type Output = AnnotatedItem;

  fn annotate(self, a: &Annotator) -> AnnotatedItem {
    AnnotatedItem { card: self.card.annotate(a), log: self.log.annotate(a) }
  }
}

impl Annotate for RecordLog {
  type Output = BTreeMap<Grade, AnnotatedItem>;

  fn annotate(self, a: &Annotator) -> Self::Output {
    self
      .into_iter()
      .map(|(grade, item)| (grade, item.annotate(a)))
      .collect()
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedReschedule {
  pub collections:     Vec<AnnotatedItem>,
  pub reschedule_item: Option<AnnotatedItem>,
}

impl Annotate for RescheduleResult {
  type Output = AnnotatedReschedule;

  fn annotate(self, a: &Annotator) -> AnnotatedReschedule {
    AnnotatedReschedule {
      collections:     self
        .collections
        .into_iter()
        .map(|item| item.annotate(a))
        .collect(),
      reschedule_item: self.reschedule_item.map(|item| item.annotate(a)),
    }
  }
}

#[cfg(test)]
mod tests {
  use tempo_core::{Fsrs, Parameters};

  use super::*;

  fn item_at(ms: i64) -> RecordLogItem {
    let now = DateTime::from_timestamp_millis(ms).unwrap();
    let f = Fsrs::new(Parameters::default()).unwrap();
    f.next(&Card::new(now), now, Grade::Good)
  }

  #[test]
  fn shanghai_is_eight_hours_ahead() {
    let item = item_at(1_700_000_000_000);
    let utc = item.clone().annotate(&Annotator::new(None, Tz::UTC));
    let cst = item.annotate(&Annotator::new(None, Tz::Asia__Shanghai));

    assert_eq!(utc.log.review, "2023-11-14T22:13:20+00:00");
    assert_eq!(cst.log.review, "2023-11-15T06:13:20+08:00");
    assert_eq!(cst.log.due, "2023-11-15T06:13:20+08:00");
    assert_eq!(cst.card.last_review.as_deref(), Some("2023-11-15T06:13:20+08:00"));
    assert_eq!(cst.card.due, "2023-11-15T06:23:20+08:00");
    assert_eq!(utc.card.stability, cst.card.stability);
    assert_eq!(utc.card.difficulty, cst.card.difficulty);
  }

  #[test]
  fn every_timestamp_is_the_same_instant() {
    let item = item_at(1_700_000_123_456);
    let out = item.clone().annotate(&Annotator::new(None, Tz::America__New_York));
    let parse = |s: &str| DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc);
    assert_eq!(parse(&out.card.due), item.card.due);
    assert_eq!(parse(out.card.last_review.as_deref().unwrap()), item.card.last_review.unwrap());
    assert_eq!(parse(&out.log.due), item.log.due);
    assert_eq!(parse(&out.log.review), item.log.review);
    assert!(out.log.review.ends_with("-05:00"), "{}", out.log.review);
  }

  #[test]
  fn card_id_is_attached_to_card_and_log() {
    let out = item_at(0).annotate(&Annotator::new(Some("c-1".into()), Tz::UTC));
    assert_eq!(out.card.card_id.as_deref(), Some("c-1"));
    assert_eq!(out.log.card_id.as_deref(), Some("c-1"));

    let bare = item_at(0).annotate(&Annotator::new(None, Tz::UTC));
    let json = serde_json::to_value(&bare).unwrap();
    assert!(json["card"].get("card_id").is_none());
  }
}
