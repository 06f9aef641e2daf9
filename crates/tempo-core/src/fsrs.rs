//! The engine facade: every scheduling operation the gateway exposes.

use chrono::{DateTime, Utc};

use crate::{
  Card, Error, Grade, Parameters, Rating, RecordLog, RecordLogItem, Result,
  ReviewLog, State,
  algorithm::{Algorithm, forgetting_curve},
  scheduler::ReviewStep,
  strategy::{DefaultSeed, SeedInput, SeedStrategy, fuzz_factor},
  time,
};

/// A scheduler bound to one validated parameter set and one seed strategy.
///
/// Cheap to build; callers construct one per request.
pub struct Fsrs {
  algo:     Algorithm,
  strategy: Box<dyn SeedStrategy + Send + Sync>,
}

impl std::fmt::Debug for Fsrs {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Fsrs").field("params", &self.algo.params).finish()
  }
}

impl Fsrs {
  pub fn new(parameters: Parameters) -> Result<Self> {
    Ok(Self {
      algo:     Algorithm::new(parameters.checked()?),
      strategy: Box::new(DefaultSeed),
    })
  }

  /// Replace the seed strategy used for interval fuzz.
  pub fn with_strategy(
    mut self,
    strategy: impl SeedStrategy + Send + Sync + 'static,
  ) -> Self {
    self.strategy = Box::new(strategy);
    self
  }

  pub fn parameters(&self) -> &Parameters { &self.algo.params }

  /// A fresh New card anchored at `now`.
  pub fn create_empty_card(now: DateTime<Utc>) -> Card { Card::new(now) }

  fn step<'a>(&'a self, card: &'a Card, now: DateTime<Utc>) -> ReviewStep<'a> {
    let step = ReviewStep::new(&self.algo, card, now);
    let factor = self.algo.params.enable_fuzz.then(|| {
      let seed = self.strategy.seed(&SeedInput {
        review: now,
        card:   step.current(),
      });
      fuzz_factor(&seed)
    });
    step.with_fuzz(factor)
  }

  /// Outcomes for every grade if `card` were reviewed at `now`.
  pub fn repeat(&self, card: &Card, now: DateTime<Utc>) -> RecordLog {
    self.step(card, now).preview()
  }

  /// The outcome of reviewing `card` at `now` with `grade`.
  pub fn next(
    &self,
    card: &Card,
    now: DateTime<Utc>,
    grade: Grade,
  ) -> RecordLogItem {
    self.step(card, now).review(grade)
  }

  /// Probability that `card` is still recalled at `now`.
  ///
  /// Zero for cards that were never reviewed.
  pub fn retrievability(&self, card: &Card, now: DateTime<Utc>) -> f64 {
    if card.state == State::New || card.stability <= 0.0 {
      return 0.0;
    }
    let elapsed = card
      .last_review
      .map(|reviewed| time::elapsed_days(now, reviewed))
      .unwrap_or(0);
    forgetting_curve(f64::from(elapsed), card.stability)
  }

  /// Reconstruct the card as it was before the review described by `log`.
  pub fn rollback(&self, card: &Card, log: &ReviewLog) -> Result<Card> {
    if log.rating == Rating::Manual {
      return Err(Error::ManualRollback);
    }
    if card.reps == 0 {
      return Err(Error::NothingToRollback);
    }
    if card.last_review != Some(log.review) {
      return Err(Error::LogMismatch {
        log:  log.review,
        card: card.last_review,
      });
    }

    let lapsed = log.rating == Rating::Again && log.state == State::Review;
    Ok(Card {
      due: log.due,
      stability: log.stability,
      difficulty: log.difficulty,
      elapsed_days: log.last_elapsed_days,
      scheduled_days: log.scheduled_days,
      learning_steps: log.learning_steps,
      reps: card.reps - 1,
      lapses: card.lapses.saturating_sub(u32::from(lapsed)),
      state: log.state,
      last_review: log.last_review,
    })
  }

  /// Reset `card` to a New memory state at `now`.
  ///
  /// With `reset_count` the review counters and `last_review` are cleared
  /// too; otherwise they survive the reset.
  pub fn forget(
    &self,
    card: &Card,
    now: DateTime<Utc>,
    reset_count: bool,
  ) -> RecordLogItem {
    let log = ReviewLog::snapshot(card, Rating::Manual, 0, now);
    let forgotten = Card {
      reps: if reset_count { 0 } else { card.reps },
      lapses: if reset_count { 0 } else { card.lapses },
      last_review: if reset_count { None } else { card.last_review },
      ..Card::new(now)
    };
    RecordLogItem { card: forgotten, log }
  }
}

/// `0.9` → `"90.00%"`.
pub fn format_retrievability(r: f64) -> String { format!("{:.2}%", r * 100.0) }
