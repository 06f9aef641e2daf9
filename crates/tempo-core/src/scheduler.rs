//! One scheduling step: every grade's outcome for a card reviewed at `now`.
//!
//! All four outcomes are computed together because review intervals are
//! ordered against each other (`hard <= good < easy`). Picking a single
//! grade therefore always agrees with the full preview.

use chrono::{DateTime, Utc};

use crate::{
  Card, Grade, RecordLog, RecordLogItem, ReviewLog, State,
  algorithm::{Algorithm, forgetting_curve},
  time,
};

/// Minutes in a day; steps at or beyond this graduate the card.
const DAY_MINUTES: u32 = 1440;

/// Where the step ladder sends a card for one grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepOutcome {
  minutes:   u32,
  next_step: u32,
}

pub(crate) struct ReviewStep<'a> {
  algo:         &'a Algorithm,
  last:         &'a Card,
  /// `last` with review bookkeeping applied (reps, elapsed, last_review).
  current:      Card,
  now:          DateTime<Utc>,
  elapsed_days: u32,
  fuzz_factor:  Option<f64>,
}

impl<'a> ReviewStep<'a> {
  pub(crate) fn new(
    algo: &'a Algorithm,
    last: &'a Card,
    now: DateTime<Utc>,
  ) -> Self {
    let elapsed_days = match (last.state, last.last_review) {
      (State::New, _) | (_, None) => 0,
      (_, Some(reviewed)) => time::elapsed_days(now, reviewed),
    };
    let current = Card {
      elapsed_days,
      reps: last.reps.saturating_add(1),
      last_review: Some(now),
      ..last.clone()
    };
    Self { algo, last, current, now, elapsed_days, fuzz_factor: None }
  }

  /// The card as the seed strategy sees it.
  pub(crate) fn current(&self) -> &Card { &self.current }

  pub(crate) fn with_fuzz(mut self, factor: Option<f64>) -> Self {
    self.fuzz_factor = factor;
    self
  }

  pub(crate) fn preview(&self) -> RecordLog {
    Grade::ALL
      .into_iter()
      .zip(self.outcomes())
      .map(|(grade, card)| (grade, self.item(grade, card)))
      .collect()
  }

  pub(crate) fn review(&self, grade: Grade) -> RecordLogItem {
    let [again, hard, good, easy] = self.outcomes();
    let card = match grade {
      Grade::Again => again,
      Grade::Hard => hard,
      Grade::Good => good,
      Grade::Easy => easy,
    };
    self.item(grade, card)
  }

  fn item(&self, grade: Grade, card: Card) -> RecordLogItem {
    RecordLogItem {
      card,
      log: ReviewLog::snapshot(
        self.last,
        grade.into(),
        self.elapsed_days,
        self.now,
      ),
    }
  }

  // ─── State dispatch ────────────────────────────────────────────────────────

  fn outcomes(&self) -> [Card; 4] {
    let short_term = self.algo.params.enable_short_term;
    match self.last.state {
      State::New => self.new_state(),
      State::Learning | State::Relearning if short_term => {
        self.learning_state()
      }
      _ => self.review_state(),
    }
  }

  fn new_state(&self) -> [Card; 4] {
    let mut cards = Grade::ALL.map(|g| Card {
      difficulty: self.algo.init_difficulty(g),
      stability: self.algo.init_stability(g),
      ..self.current.clone()
    });
    if self.algo.params.enable_short_term {
      for (card, g) in cards.iter_mut().zip(Grade::ALL) {
        self.apply_steps(card, g, State::Learning);
      }
    } else {
      self.whole_day_intervals(&mut cards);
    }
    cards
  }

  fn learning_state(&self) -> [Card; 4] {
    let (d, s) = (self.last.difficulty, self.last.stability);
    let mut cards = Grade::ALL.map(|g| Card {
      difficulty: self.algo.next_difficulty(d, g),
      stability: self.algo.next_short_term_stability(s, g),
      ..self.current.clone()
    });
    for (card, g) in cards.iter_mut().zip(Grade::ALL) {
      self.apply_steps(card, g, self.last.state);
    }
    cards
  }

  fn review_state(&self) -> [Card; 4] {
    let (d, s) = (self.last.difficulty, self.last.stability);
    let r = forgetting_curve(f64::from(self.elapsed_days), s);
    let short_term = self.algo.params.enable_short_term;

    let mut cards = Grade::ALL.map(|g| {
      let stability = match g {
        Grade::Again => {
          let forgotten = self.algo.next_forget_stability(d, s, r);
          if short_term {
            forgotten.min(self.algo.short_term_lapse_cap(s))
          } else {
            forgotten
          }
        }
        _ => self.algo.next_recall_stability(d, s, r, g),
      };
      Card {
        difficulty: self.algo.next_difficulty(d, g),
        stability,
        ..self.current.clone()
      }
    });

    if short_term {
      let [again, rest @ ..] = &mut cards;
      self.ordered_intervals(rest);
      self.apply_steps(again, Grade::Again, State::Relearning);
    } else {
      self.whole_day_intervals(&mut cards);
    }
    if self.last.state == State::Review {
      cards[0].lapses = cards[0].lapses.saturating_add(1);
    }
    cards
  }

  // ─── Intervals ─────────────────────────────────────────────────────────────

  fn interval(&self, stability: f64) -> u32 {
    self
      .algo
      .next_interval(stability, self.elapsed_days, self.fuzz_factor)
  }

  fn schedule_days(&self, card: &mut Card, days: u32) {
    card.state = State::Review;
    card.learning_steps = 0;
    card.scheduled_days = days;
    card.due = time::add_days(self.now, days);
  }

  /// Hard, good, easy as whole-day review intervals.
  fn ordered_intervals(&self, cards: &mut [Card; 3]) {
    let [hard, good, easy] = cards;
    let mut hard_ivl = self.interval(hard.stability);
    let mut good_ivl = self.interval(good.stability);
    hard_ivl = hard_ivl.min(good_ivl);
    good_ivl = good_ivl.max(hard_ivl.saturating_add(1));
    let easy_ivl = self
      .interval(easy.stability)
      .max(good_ivl.saturating_add(1));
    self.schedule_days(hard, hard_ivl);
    self.schedule_days(good, good_ivl);
    self.schedule_days(easy, easy_ivl);
  }

  /// All four grades as whole-day review intervals (short-term disabled).
  fn whole_day_intervals(&self, cards: &mut [Card; 4]) {
    let [again, hard, good, easy] = cards;
    let mut again_ivl = self.interval(again.stability);
    let mut hard_ivl = self.interval(hard.stability);
    again_ivl = again_ivl.min(hard_ivl);
    hard_ivl = hard_ivl.max(again_ivl.saturating_add(1));
    let good_ivl = self
      .interval(good.stability)
      .max(hard_ivl.saturating_add(1));
    let easy_ivl = self
      .interval(easy.stability)
      .max(good_ivl.saturating_add(1));
    self.schedule_days(again, again_ivl);
    self.schedule_days(hard, hard_ivl);
    self.schedule_days(good, good_ivl);
    self.schedule_days(easy, easy_ivl);
  }

  // ─── Step ladder ───────────────────────────────────────────────────────────

  /// Route `card` through the (re)learning ladder, graduating it to a
  /// whole-day interval when the ladder has no rung for `grade`.
  fn apply_steps(&self, card: &mut Card, grade: Grade, to_state: State) {
    match self.step_outcome(grade) {
      Some(step) if step.minutes < DAY_MINUTES => {
        card.state = to_state;
        card.learning_steps = step.next_step;
        card.scheduled_days = 0;
        card.due = time::add_minutes(self.now, step.minutes);
      }
      Some(step) => {
        card.state = State::Review;
        card.learning_steps = 0;
        card.scheduled_days = step.minutes / DAY_MINUTES;
        card.due = time::add_minutes(self.now, step.minutes);
      }
      None => {
        let days = self.interval(card.stability);
        self.schedule_days(card, days);
      }
    }
  }

  fn step_outcome(&self, grade: Grade) -> Option<StepOutcome> {
    let params = &self.algo.params;
    let (ladder, cur) = match self.last.state {
      State::New => (&params.learning_steps, 0),
      State::Learning => (&params.learning_steps, self.last.learning_steps),
      State::Review => (&params.relearning_steps, 0),
      State::Relearning => {
        (&params.relearning_steps, self.last.learning_steps)
      }
    };
    let rung = |i: u32| ladder.get(i as usize).map(|s| s.minutes());
    let first = rung(0)?;

    if grade == Grade::Again {
      return Some(StepOutcome { minutes: first, next_step: 0 });
    }
    if self.last.state == State::Review {
      return None;
    }
    // The ladder may have shrunk since the card's step was recorded.
    let last_index = u32::try_from(ladder.len() - 1).unwrap_or(u32::MAX);
    let cur = cur.min(last_index);
    match grade {
      Grade::Hard => {
        let minutes = match (cur, rung(1)) {
          (0, Some(second)) => (first + second).div_ceil(2),
          (0, None) => (f64::from(first) * 1.5).round() as u32,
          _ => rung(cur).unwrap_or(first),
        };
        Some(StepOutcome { minutes, next_step: cur })
      }
      Grade::Good => rung(cur + 1)
        .map(|minutes| StepOutcome { minutes, next_step: cur + 1 }),
      Grade::Again | Grade::Easy => None,
    }
  }
}
