//! FSRS-5 memory model: stability, difficulty and interval formulas.

use crate::{Grade, Parameters};

/// Forgetting-curve exponent.
pub(crate) const DECAY: f64 = -0.5;
/// Chosen so that retrievability is exactly 0.9 when `t == S`.
pub(crate) const FACTOR: f64 = 19.0 / 81.0;

const S_MIN: f64 = 0.01;
const S_MAX: f64 = 36500.0;
const D_MIN: f64 = 1.0;
const D_MAX: f64 = 10.0;

/// Fuzz widths per interval band: `(start, end, factor)`.
const FUZZ_RANGES: [(f64, f64, f64); 3] =
  [(2.5, 7.0, 0.15), (7.0, 20.0, 0.1), (20.0, f64::INFINITY, 0.05)];

/// Probability of recall after `elapsed_days` for a memory of `stability`.
pub(crate) fn forgetting_curve(elapsed_days: f64, stability: f64) -> f64 {
  (1.0 + FACTOR * elapsed_days / stability).powf(DECAY)
}

/// The formulas bound to one validated parameter set.
#[derive(Debug, Clone)]
pub(crate) struct Algorithm {
  pub(crate) params:  Parameters,
  interval_modifier: f64,
}

impl Algorithm {
  pub(crate) fn new(params: Parameters) -> Self {
    let interval_modifier =
      (params.request_retention.powf(1.0 / DECAY) - 1.0) / FACTOR;
    Self { params, interval_modifier }
  }

  fn w(&self, i: usize) -> f64 { self.params.w[i] }

  pub(crate) fn init_stability(&self, g: Grade) -> f64 {
    self.w(g as usize - 1).max(0.1)
  }

  /// Unclamped; [`Self::next_difficulty`] relies on the raw value for mean
  /// reversion.
  fn raw_init_difficulty(&self, g: Grade) -> f64 {
    self.w(4) - ((g.value() - 1.0) * self.w(5)).exp() + 1.0
  }

  pub(crate) fn init_difficulty(&self, g: Grade) -> f64 {
    self.raw_init_difficulty(g).clamp(D_MIN, D_MAX)
  }

  pub(crate) fn next_difficulty(&self, d: f64, g: Grade) -> f64 {
    let delta = -self.w(6) * (g.value() - 3.0);
    let damped = d + delta * (10.0 - d) / 9.0;
    let reverted = self.w(7) * self.raw_init_difficulty(Grade::Easy)
      + (1.0 - self.w(7)) * damped;
    reverted.clamp(D_MIN, D_MAX)
  }

  pub(crate) fn next_recall_stability(
    &self,
    d: f64,
    s: f64,
    r: f64,
    g: Grade,
  ) -> f64 {
    let hard_penalty = if g == Grade::Hard { self.w(15) } else { 1.0 };
    let easy_bonus = if g == Grade::Easy { self.w(16) } else { 1.0 };
    let growth = self.w(8).exp()
      * (11.0 - d)
      * s.powf(-self.w(9))
      * (((1.0 - r) * self.w(10)).exp() - 1.0)
      * hard_penalty
      * easy_bonus;
    (s * (1.0 + growth)).clamp(S_MIN, S_MAX)
  }

  pub(crate) fn next_forget_stability(&self, d: f64, s: f64, r: f64) -> f64 {
    let next = self.w(11)
      * d.powf(-self.w(12))
      * ((s + 1.0).powf(self.w(13)) - 1.0)
      * ((1.0 - r) * self.w(14)).exp();
    next.clamp(S_MIN, S_MAX)
  }

  /// Same-day (short-term) stability update used while on the step ladder.
  pub(crate) fn next_short_term_stability(&self, s: f64, g: Grade) -> f64 {
    (s * (self.w(17) * (g.value() - 3.0 + self.w(18))).exp()).clamp(S_MIN, S_MAX)
  }

  /// Ceiling on post-lapse stability while short-term scheduling is on.
  pub(crate) fn short_term_lapse_cap(&self, s: f64) -> f64 {
    (s / (self.w(17) * self.w(18)).exp()).max(S_MIN)
  }

  /// Days until the next review for a memory of `stability`, fuzzed when
  /// `fuzz_factor` is given.
  pub(crate) fn next_interval(
    &self,
    stability: f64,
    elapsed_days: u32,
    fuzz_factor: Option<f64>,
  ) -> u32 {
    let max = f64::from(self.params.maximum_interval);
    let ivl = (stability * self.interval_modifier).round().clamp(1.0, max);
    match fuzz_factor {
      Some(factor) if ivl >= 2.5 => {
        let (lo, hi) = fuzz_range(ivl, f64::from(elapsed_days), max);
        (factor * (hi - lo + 1.0) + lo).floor().min(hi) as u32
      }
      _ => ivl as u32,
    }
  }
}

fn fuzz_range(ivl: f64, elapsed_days: f64, max: f64) -> (f64, f64) {
  let delta = FUZZ_RANGES.iter().fold(1.0, |acc, (start, end, factor)| {
    acc + factor * (ivl.min(*end) - start).max(0.0)
  });
  let ivl = ivl.min(max);
  let mut lo = (ivl - delta).round().max(2.0);
  let hi = (ivl + delta).round().min(max);
  if ivl > elapsed_days {
    lo = lo.max(elapsed_days + 1.0);
  }
  (lo.min(hi), hi)
}
