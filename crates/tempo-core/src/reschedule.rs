//! Replaying a full review history under (possibly new) parameters.
//!
//! Graded entries are replayed through [`Fsrs::next`]; manual entries become
//! manual transitions that force the recorded state and due date. The final
//! replayed card is then reconciled with the caller's current card by one
//! more manual transition, the `reschedule_item`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Card, Error, Fsrs, Grade, Rating, RecordLogItem, Result, ReviewLog, State,
  time::{self, instant},
};

/// One entry of a review history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub rating:     Rating,
  #[serde(with = "instant")]
  pub review:     DateTime<Utc>,
  /// Required for manual entries: the state the card was moved to.
  #[serde(default)]
  pub state:      Option<State>,
  /// Required for manual entries that leave the New state.
  #[serde(default, with = "instant::option")]
  pub due:        Option<DateTime<Utc>>,
  #[serde(default)]
  pub stability:  Option<f64>,
  #[serde(default)]
  pub difficulty: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct RescheduleOptions {
  /// Instant of the reconciling transition.
  pub now:                 DateTime<Utc>,
  /// Drop manual entries before replaying.
  pub skip_manual:         bool,
  /// Carry the replayed stability and difficulty onto the current card, not
  /// only its state and due date.
  pub update_memory_state: bool,
  /// Card the replay starts from; an empty card due at `now` otherwise.
  pub first_card:          Option<Card>,
}

impl RescheduleOptions {
  pub fn new(now: DateTime<Utc>) -> Self {
    Self {
      now,
      skip_manual: false,
      update_memory_state: false,
      first_card: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleResult {
  /// One item per replayed history entry, in order.
  pub collections:     Vec<RecordLogItem>,
  /// Transition from the current card to the replayed schedule; `None` when
  /// nothing was replayed or the due dates already agree.
  pub reschedule_item: Option<RecordLogItem>,
}

/// Target of a manual transition.
struct ManualTarget {
  state:        Option<State>,
  review:       DateTime<Utc>,
  elapsed_days: u32,
  due:          Option<DateTime<Utc>>,
  stability:    Option<f64>,
  difficulty:   Option<f64>,
}

impl Fsrs {
  pub fn reschedule(
    &self,
    current: &Card,
    history: &[HistoryEntry],
    options: &RescheduleOptions,
  ) -> Result<RescheduleResult> {
    let mut card = options
      .first_card
      .clone()
      .unwrap_or_else(|| Card::new(options.now));
    let mut collections = Vec::with_capacity(history.len());

    let entries = history
      .iter()
      .filter(|e| !(options.skip_manual && e.rating == Rating::Manual));
    for entry in entries {
      let item = match Grade::try_from(entry.rating) {
        Ok(grade) => self.next(&card, entry.review, grade),
        Err(_) => {
          let elapsed_days = match (card.state, card.last_review) {
            (State::New, _) | (_, None) => 0,
            (_, Some(last)) => time::elapsed_days(entry.review, last),
          };
          manual_transition(&card, ManualTarget {
            state: entry.state,
            review: entry.review,
            elapsed_days,
            due: entry.due,
            stability: entry.stability,
            difficulty: entry.difficulty,
          })?
        }
      };
      card = item.card.clone();
      collections.push(item);
    }

    let reschedule_item = match collections.last() {
      Some(last) => reconcile(current, last, options)?,
      None => None,
    };
    Ok(RescheduleResult { collections, reschedule_item })
  }
}

/// Move the caller's current card onto the replayed schedule.
fn reconcile(
  current: &Card,
  replayed: &RecordLogItem,
  options: &RescheduleOptions,
) -> Result<Option<RecordLogItem>> {
  let target = &replayed.card;
  if current.due == target.due {
    return Ok(None);
  }
  let card = Card {
    scheduled_days: time::elapsed_days(target.due, current.due),
    ..current.clone()
  };
  let memory = options.update_memory_state;
  manual_transition(&card, ManualTarget {
    state:        Some(target.state),
    review:       options.now,
    elapsed_days: replayed.log.elapsed_days,
    due:          Some(target.due),
    stability:    memory.then_some(target.stability),
    difficulty:   memory.then_some(target.difficulty),
  })
  .map(Some)
}

fn manual_transition(card: &Card, target: ManualTarget) -> Result<RecordLogItem> {
  let state = target.state.ok_or(Error::IncompleteManualEntry {
    review: target.review,
    field:  "state",
  })?;
  let log =
    ReviewLog::snapshot(card, Rating::Manual, target.elapsed_days, target.review);

  if state == State::New {
    let reset = Card {
      last_review: Some(target.review),
      ..Card::new(target.review)
    };
    return Ok(RecordLogItem { card: reset, log });
  }

  let due = target.due.ok_or(Error::IncompleteManualEntry {
    review: target.review,
    field:  "due",
  })?;
  let next = Card {
    state,
    due,
    last_review: Some(target.review),
    stability: target
      .stability
      .filter(|s| *s > 0.0)
      .unwrap_or(card.stability),
    difficulty: target
      .difficulty
      .filter(|d| *d > 0.0)
      .unwrap_or(card.difficulty),
    elapsed_days: target.elapsed_days,
    scheduled_days: time::elapsed_days(due, target.review),
    learning_steps: 0,
    reps: card.reps.saturating_add(1),
    ..card.clone()
  };
  Ok(RecordLogItem { card: next, log })
}
