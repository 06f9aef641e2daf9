//! Request body decoding.
//!
//! Bodies are `{ "data": <payload>, "parameters"?: <Parameters> }`. Only the
//! envelope is checked here; the payload shape is whatever `T` accepts.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tempo_core::Parameters;

use crate::error::ApiError;

/// A decoded request body.
#[derive(Debug)]
pub struct Payload<T> {
  pub data:       T,
  pub parameters: Parameters,
}

/// Decode `body`. `subject` names the payload in the missing-data message,
/// e.g. `"card"` → `Invalid card, request field : data`.
pub fn decode<T: DeserializeOwned>(
  body: &[u8],
  subject: &str,
) -> Result<Payload<T>, ApiError> {
  let mut envelope: Value = serde_json::from_slice(body)
    .map_err(|_| ApiError::BadRequest("Invalid JSON or missing body".into()))?;

  let data = take_field(&mut envelope, "data").ok_or_else(|| {
    ApiError::BadRequest(format!("Invalid {subject}, request field : data"))
  })?;
  let data = serde_json::from_value(data)
    .map_err(|e| ApiError::BadRequest(format!("invalid data: {e}")))?;

  let parameters = match take_field(&mut envelope, "parameters") {
    None => Parameters::default(),
    Some(p) => serde_json::from_value(p)
      .map_err(|e| ApiError::BadRequest(format!("invalid parameters: {e}")))?,
  };

  Ok(Payload { data, parameters })
}

/// Remove `key` from a JSON object; `null` counts as absent.
fn take_field(envelope: &mut Value, key: &str) -> Option<Value> {
  envelope
    .as_object_mut()
    .and_then(|o| o.remove(key))
    .filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
  use tempo_core::Card;

  use super::*;

  const CARD: &str = r#"{"due":"2024-01-01T00:00:00Z","stability":0,
    "difficulty":0,"elapsed_days":0,"scheduled_days":0,"reps":0,"lapses":0,
    "state":0}"#;

  #[test]
  fn decodes_card_with_default_parameters() {
    let body = format!(r#"{{"data":{CARD}}}"#);
    let payload = decode::<Card>(body.as_bytes(), "card").unwrap();
    assert_eq!(payload.data.reps, 0);
    assert_eq!(payload.parameters, Parameters::default());
  }

  #[test]
  fn missing_data_names_the_field() {
    for body in [r#"{}"#, r#"{"data":null}"#, r#"[1,2]"#] {
      let err = decode::<Card>(body.as_bytes(), "card").unwrap_err();
      assert_eq!(err.to_string(), "Invalid card, request field : data");
    }
  }

  #[test]
  fn non_json_is_rejected() {
    for body in ["", "not json", "{\"data\":"] {
      let err = decode::<Card>(body.as_bytes(), "card").unwrap_err();
      assert_eq!(err.to_string(), "Invalid JSON or missing body");
    }
  }

  #[test]
  fn wrong_shapes_are_client_errors() {
    let err = decode::<Card>(br#"{"data":{"due":5}}"#, "card").unwrap_err();
    assert!(err.to_string().starts_with("invalid data"), "{err}");

    let body = format!(r#"{{"data":{CARD},"parameters":{{"w":"x"}}}}"#);
    let err = decode::<Card>(body.as_bytes(), "card").unwrap_err();
    assert!(err.to_string().starts_with("invalid parameters"), "{err}");
  }
}
