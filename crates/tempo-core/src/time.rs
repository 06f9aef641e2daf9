//! Instant helpers shared by the engine.
//!
//! Instants are carried as `DateTime<Utc>`. On the wire they are accepted
//! either as RFC 3339 text (any offset) or as epoch milliseconds.

use chrono::{DateTime, Duration, Utc};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Whole days from `earlier` to `later`, floored. Negative when `later`
/// precedes `earlier`.
pub fn day_diff(later: DateTime<Utc>, earlier: DateTime<Utc>) -> i64 {
  (later - earlier).num_milliseconds().div_euclid(DAY_MS)
}

/// [`day_diff`] clamped into the non-negative day counters used on cards.
pub fn elapsed_days(later: DateTime<Utc>, earlier: DateTime<Utc>) -> u32 {
  u32::try_from(day_diff(later, earlier).max(0)).unwrap_or(u32::MAX)
}

/// Saturates at the latest representable instant.
pub(crate) fn add_minutes(at: DateTime<Utc>, minutes: u32) -> DateTime<Utc> {
  at.checked_add_signed(Duration::minutes(i64::from(minutes)))
    .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Saturates at the latest representable instant.
pub(crate) fn add_days(at: DateTime<Utc>, days: u32) -> DateTime<Utc> {
  at.checked_add_signed(Duration::days(i64::from(days)))
    .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `serde` adapter for a required instant.
pub mod instant {
  use std::fmt;

  use chrono::{DateTime, SecondsFormat, Utc};
  use serde::{
    Deserialize, Deserializer, Serializer,
    de::{self, Visitor},
  };

  pub fn serialize<S: Serializer>(
    at: &DateTime<Utc>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<DateTime<Utc>, D::Error> {
    deserializer.deserialize_any(InstantVisitor)
  }

  struct InstantVisitor;

  impl<'de> Visitor<'de> for InstantVisitor {
    type Value = DateTime<Utc>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
      f.write_str("an RFC 3339 timestamp or epoch milliseconds")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
      DateTime::parse_from_rfc3339(v.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| E::custom(format!("invalid timestamp {v:?}: {e}")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
      DateTime::from_timestamp_millis(v)
        .ok_or_else(|| E::custom(format!("timestamp {v} out of range")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
      let ms = i64::try_from(v)
        .map_err(|_| E::custom(format!("timestamp {v} out of range")))?;
      self.visit_i64(ms)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
      if !v.is_finite() {
        return Err(E::custom("timestamp is not finite"));
      }
      self.visit_i64(v.round() as i64)
    }
  }

  /// Wrapper so `Option<DateTime<Utc>>` can reuse the visitor above.
  #[derive(Deserialize)]
  struct Wrapped(#[serde(with = "super::instant")] DateTime<Utc>);

  /// `serde` adapter for an optional instant; `null` and absence both map
  /// to `None`.
  pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
      at: &Option<DateTime<Utc>>,
      serializer: S,
    ) -> Result<S::Ok, S::Error> {
      match at {
        Some(at) => super::serialize(at, serializer),
        None => serializer.serialize_none(),
      }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
      deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
      Ok(Option::<super::Wrapped>::deserialize(deserializer)?.map(|w| w.0))
    }
  }
}
