//! Behavioural tests for the scheduling engine.

use chrono::{DateTime, Duration, Utc};

use crate::{
  Card, CardIdSeed, Error, Fsrs, Grade, HistoryEntry, Parameters, Rating,
  RescheduleOptions, State, format_retrievability,
};

const T0: i64 = 1_700_000_000;

fn at(secs: i64) -> DateTime<Utc> { DateTime::from_timestamp(secs, 0).unwrap() }

fn days(n: i64) -> Duration { Duration::days(n) }

fn engine(params: Parameters) -> Fsrs { Fsrs::new(params).unwrap() }

fn short_term() -> Fsrs { engine(Parameters::default()) }

fn long_term() -> Fsrs {
  engine(Parameters { enable_short_term: false, ..Parameters::default() })
}

fn fuzzed() -> Fsrs {
  engine(Parameters { enable_fuzz: true, ..Parameters::default() })
}

/// Cards in every state, each paired with the instant it is next reviewed.
fn scenarios(f: &Fsrs) -> Vec<(Card, DateTime<Utc>)> {
  let start = at(T0);
  let new = Card::new(start);
  let learning = f.next(&new, start, Grade::Good).card;
  let learning_at = start + Duration::minutes(10);
  let review = f.next(&new, start, Grade::Easy).card;
  let review_at = review.due + days(3);
  let relearning = f.next(&review, review_at, Grade::Again).card;
  let relearning_at = relearning.due;
  let mature = f.next(&review, review_at, Grade::Good).card;
  let mature_at = mature.due - days(2);
  let forgotten = f.forget(&mature, mature_at, false).card;
  let forgotten_at = mature_at + days(1);
  let reset = f.forget(&mature, mature_at, true).card;
  vec![
    (new, start),
    (learning, learning_at),
    (review, review_at),
    (relearning, relearning_at),
    (mature, mature_at),
    (forgotten, forgotten_at),
    (reset, forgotten_at),
  ]
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[test]
fn created_card_is_unreviewed() {
  let card = Fsrs::create_empty_card(at(T0));
  assert_eq!(card.state, State::New);
  assert_eq!(card.reps, 0);
  assert_eq!(card.lapses, 0);
  assert!(card.last_review.is_none());
  assert_eq!(card.due, at(T0));
}

// ─── Grading ─────────────────────────────────────────────────────────────────

#[test]
fn new_card_follows_learning_steps() {
  let f = short_term();
  let now = at(T0);
  let log = f.repeat(&Card::new(now), now);

  let again = &log[&Grade::Again].card;
  assert_eq!(again.state, State::Learning);
  assert_eq!(again.due, now + Duration::minutes(1));

  let hard = &log[&Grade::Hard].card;
  assert_eq!(hard.due, now + Duration::minutes(6));
  assert_eq!(hard.learning_steps, 0);

  let good = &log[&Grade::Good].card;
  assert_eq!(good.due, now + Duration::minutes(10));
  assert_eq!(good.learning_steps, 1);
  assert_eq!(good.scheduled_days, 0);

  let easy = &log[&Grade::Easy].card;
  assert_eq!(easy.state, State::Review);
  assert_eq!(easy.scheduled_days, 16);
  assert_eq!(easy.due, now + days(16));

  for item in log.values() {
    assert_eq!(item.card.reps, 1);
    assert_eq!(item.card.last_review, Some(now));
    assert_eq!(item.log.state, State::New);
    assert_eq!(item.log.review, now);
  }
}

#[test]
fn good_on_last_step_graduates() {
  let f = short_term();
  let (learning, when) = scenarios(&f)[1].clone();
  assert_eq!(learning.learning_steps, 1);
  let next = f.next(&learning, when, Grade::Good).card;
  assert_eq!(next.state, State::Review);
  assert!(next.scheduled_days >= 1);
}

#[test]
fn step_index_past_a_shorter_ladder_is_clamped() {
  let f = short_term();
  let now = at(T0);
  let (learning, _) = scenarios(&f)[1].clone();
  let stale = Card { learning_steps: 4, ..learning };
  let all = f.repeat(&stale, now);

  let again = &all[&Grade::Again].card;
  assert_eq!(again.state, State::Learning);
  assert_eq!(again.learning_steps, 0);
  assert_eq!(again.due, now + Duration::minutes(1));

  let hard = &all[&Grade::Hard].card;
  assert_eq!(hard.state, State::Learning);
  assert_eq!(hard.learning_steps, 1);
  assert_eq!(hard.due, now + Duration::minutes(10));

  assert_eq!(all[&Grade::Good].card.state, State::Review);
  assert_eq!(all[&Grade::Easy].card.state, State::Review);

  let (relearning, _) = scenarios(&f)[3].clone();
  let stale = Card { learning_steps: 3, ..relearning };
  let again = f.next(&stale, now, Grade::Again).card;
  assert_eq!(again.state, State::Relearning);
  assert_eq!(again.due, now + Duration::minutes(10));
}

#[test]
fn longest_intervals_do_not_overflow() {
  let params = Parameters {
    request_retention: 0.01,
    maximum_interval: 36500,
    ..Parameters::default()
  };
  let now = at(T0);
  let ancient = Card {
    state: State::Review,
    stability: 36500.0,
    difficulty: 5.0,
    reps: 10,
    last_review: Some(now - days(400)),
    ..Card::new(now - days(30))
  };
  for f in [
    engine(params.clone()),
    engine(Parameters { enable_short_term: false, ..params }),
  ] {
    let all = f.repeat(&ancient, now);
    let easy = &all[&Grade::Easy].card;
    assert!(easy.scheduled_days > all[&Grade::Good].card.scheduled_days);
    assert_eq!(easy.due, now + days(i64::from(easy.scheduled_days)));
  }
}

#[test]
fn repeat_agrees_with_next_for_every_grade() {
  for f in [short_term(), long_term(), fuzzed()] {
    for (card, now) in scenarios(&f) {
      let all = f.repeat(&card, now);
      assert_eq!(all.len(), 4);
      for grade in Grade::ALL {
        assert_eq!(all[&grade], f.next(&card, now, grade), "{grade} {card:?}");
      }
    }
  }
}

#[test]
fn review_intervals_are_ordered() {
  let f = short_term();
  let (review, when) = scenarios(&f)[2].clone();
  let all = f.repeat(&review, when);
  let ivl = |g: Grade| all[&g].card.scheduled_days;
  assert!(ivl(Grade::Hard) <= ivl(Grade::Good));
  assert!(ivl(Grade::Good) < ivl(Grade::Easy));
}

#[test]
fn lapse_moves_review_card_to_relearning() {
  let f = short_term();
  let (review, when) = scenarios(&f)[2].clone();
  let lapsed = f.next(&review, when, Grade::Again).card;
  assert_eq!(lapsed.state, State::Relearning);
  assert_eq!(lapsed.lapses, review.lapses + 1);
  assert_eq!(lapsed.due, when + Duration::minutes(10));
  assert!(lapsed.stability < review.stability);
}

#[test]
fn long_term_schedules_whole_days_from_new() {
  let f = long_term();
  let now = at(T0);
  let all = f.repeat(&Card::new(now), now);
  let mut prev = 0;
  for grade in Grade::ALL {
    let card = &all[&grade].card;
    assert_eq!(card.state, State::Review);
    assert!(card.scheduled_days > prev, "{grade}: {}", card.scheduled_days);
    prev = card.scheduled_days;
  }
}

// ─── Rollback ────────────────────────────────────────────────────────────────

#[test]
fn rollback_inverts_next_exactly() {
  for f in [short_term(), long_term(), fuzzed()] {
    for (card, now) in scenarios(&f) {
      for grade in Grade::ALL {
        let item = f.next(&card, now, grade);
        let restored = f.rollback(&item.card, &item.log).unwrap();
        assert_eq!(restored, card, "rolling back {grade}");
      }
    }
  }
}

#[test]
fn rollback_after_forget_keeps_last_review() {
  let f = short_term();
  let (mature, when) = scenarios(&f)[4].clone();
  let forgotten = f.forget(&mature, when, false).card;
  assert_eq!(forgotten.last_review, mature.last_review);

  let item = f.next(&forgotten, when + days(1), Grade::Good);
  let restored = f.rollback(&item.card, &item.log).unwrap();
  assert_eq!(restored, forgotten);
  assert!(restored.last_review.is_some());
}

#[test]
fn rollback_rejects_inconsistent_input() {
  let f = short_term();
  let now = at(T0);
  let item = f.next(&Card::new(now), now, Grade::Good);

  let mut stale = item.log.clone();
  stale.review = now - days(1);
  assert!(matches!(
    f.rollback(&item.card, &stale),
    Err(Error::LogMismatch { .. })
  ));

  let forgotten = f.forget(&item.card, now + days(1), false);
  assert!(matches!(
    f.rollback(&forgotten.card, &forgotten.log),
    Err(Error::ManualRollback)
  ));

  assert!(matches!(
    f.rollback(&Card::new(now), &item.log),
    Err(Error::NothingToRollback)
  ));
}

// ─── Retrievability ──────────────────────────────────────────────────────────

#[test]
fn retrievability_is_one_at_review_and_decays() {
  let f = short_term();
  let (review, _) = scenarios(&f)[2].clone();
  let reviewed = review.last_review.unwrap();
  assert_eq!(f.retrievability(&review, reviewed), 1.0);

  let mut prev = 1.0;
  for d in 1..200 {
    let r = f.retrievability(&review, reviewed + days(d));
    assert!(r <= prev, "day {d}: {r} > {prev}");
    prev = r;
  }
  assert!(prev < 0.9);
}

#[test]
fn retrievability_of_new_card_is_zero() {
  let f = short_term();
  assert_eq!(f.retrievability(&Card::new(at(T0)), at(T0 + 1000)), 0.0);
  assert_eq!(format_retrievability(0.0), "0.00%");
  assert_eq!(format_retrievability(0.9), "90.00%");
}

// ─── Forget ──────────────────────────────────────────────────────────────────

#[test]
fn forget_resets_memory_state() {
  let f = short_term();
  let (review, when) = scenarios(&f)[4].clone();
  assert!(review.reps > 0);

  let kept = f.forget(&review, when, false);
  assert_eq!(kept.card.state, State::New);
  assert_eq!(kept.card.stability, 0.0);
  assert_eq!(kept.card.difficulty, 0.0);
  assert_eq!(kept.card.due, when);
  assert_eq!(kept.card.reps, review.reps);
  assert_eq!(kept.card.lapses, review.lapses);
  assert_eq!(kept.log.rating, Rating::Manual);
  assert_eq!(kept.log.state, review.state);

  let reset = f.forget(&review, when, true);
  assert_eq!(reset.card.reps, 0);
  assert_eq!(reset.card.lapses, 0);
  assert!(reset.card.last_review.is_none());
}

// ─── Reschedule ──────────────────────────────────────────────────────────────

fn graded(rating: Rating, secs: i64) -> HistoryEntry {
  HistoryEntry {
    rating,
    review: at(secs),
    state: None,
    due: None,
    stability: None,
    difficulty: None,
  }
}

fn history() -> Vec<HistoryEntry> {
  const DAY: i64 = 86_400;
  vec![
    graded(Rating::Good, T0),
    graded(Rating::Good, T0 + 600),
    graded(Rating::Good, T0 + 3 * DAY),
    graded(Rating::Hard, T0 + 12 * DAY),
    graded(Rating::Again, T0 + 40 * DAY),
    graded(Rating::Good, T0 + 40 * DAY + 600),
    graded(Rating::Easy, T0 + 45 * DAY),
  ]
}

#[test]
fn reschedule_with_card_id_is_reproducible() {
  let params = Parameters { enable_fuzz: true, ..Parameters::default() };
  let options = RescheduleOptions::new(at(T0 + 100 * 86_400));
  let current = Card::new(at(T0));

  let run = || {
    let f = engine(params.clone()).with_strategy(CardIdSeed::new("card-42"));
    let result = f.reschedule(&current, &history(), &options).unwrap();
    serde_json::to_string(&result).unwrap()
  };
  assert_eq!(run(), run());
}

#[test]
fn reschedule_replays_every_entry() {
  let f = short_term();
  let options = RescheduleOptions::new(at(T0 + 100 * 86_400));
  let current = Card::new(at(T0));
  let result = f.reschedule(&current, &history(), &options).unwrap();

  assert_eq!(result.collections.len(), history().len());
  let last = result.collections.last().unwrap();
  assert_eq!(last.card.reps, history().len() as u32);
  assert_eq!(last.card.lapses, 1);

  let item = result.reschedule_item.expect("due dates differ");
  assert_eq!(item.log.rating, Rating::Manual);
  assert_eq!(item.card.due, last.card.due);
  assert_eq!(item.card.state, last.card.state);
  assert_eq!(item.card.stability, current.stability);
}

#[test]
fn reschedule_memory_state_carries_stability() {
  let f = short_term();
  let mut options = RescheduleOptions::new(at(T0 + 100 * 86_400));
  options.update_memory_state = true;
  let current = Card::new(at(T0));
  let result = f.reschedule(&current, &history(), &options).unwrap();
  let last = result.collections.last().unwrap();
  let item = result.reschedule_item.unwrap();
  assert_eq!(item.card.stability, last.card.stability);
  assert_eq!(item.card.difficulty, last.card.difficulty);
}

#[test]
fn reschedule_handles_manual_entries() {
  let f = short_term();
  let mut entries = history();
  entries.insert(3, HistoryEntry {
    state: Some(State::Review),
    due: Some(at(T0 + 20 * 86_400)),
    ..graded(Rating::Manual, T0 + 4 * 86_400)
  });
  let options = RescheduleOptions::new(at(T0 + 100 * 86_400));
  let current = Card::new(at(T0));

  let replayed = f.reschedule(&current, &entries, &options).unwrap();
  assert_eq!(replayed.collections.len(), entries.len());
  let manual = &replayed.collections[3];
  assert_eq!(manual.log.rating, Rating::Manual);
  assert_eq!(manual.card.due, at(T0 + 20 * 86_400));
  assert_eq!(manual.card.scheduled_days, 16);

  let skipped = f
    .reschedule(&current, &entries, &RescheduleOptions {
      skip_manual: true,
      ..options.clone()
    })
    .unwrap();
  assert_eq!(skipped.collections.len(), entries.len() - 1);

  entries[3].state = None;
  assert!(matches!(
    f.reschedule(&current, &entries, &options),
    Err(Error::IncompleteManualEntry { field: "state", .. })
  ));
}

#[test]
fn reschedule_of_empty_history_has_no_item() {
  let f = short_term();
  let options = RescheduleOptions::new(at(T0));
  let result = f.reschedule(&Card::new(at(T0)), &[], &options).unwrap();
  assert!(result.collections.is_empty());
  assert!(result.reschedule_item.is_none());
}
