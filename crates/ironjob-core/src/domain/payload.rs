//! Payload - message body の JSON ドキュメント
//!
//! Recognized fields: `job`, `data`, `attempts`, `queue`. Everything else is
//! carried through untouched. serde_json is built with `preserve_order`, so a
//! re-encoded payload keeps the original field order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::JobError;

const JOB: &str = "job";
const DATA: &str = "data";
const ATTEMPTS: &str = "attempts";
const QUEUE: &str = "queue";

/// Decoded message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload {
    fields: Map<String, Value>,
}

impl Payload {
    /// Build a first-attempt payload. `attempts` is left out, so attempt 1 is implied.
    pub fn new(job: impl Into<String>, data: Value, queue: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(JOB.to_string(), Value::String(job.into()));
        fields.insert(DATA.to_string(), data);
        fields.insert(QUEUE.to_string(), Value::String(queue.into()));
        Self { fields }
    }

    /// Decode a raw body. Anything other than a JSON object is malformed.
    pub fn parse(body: &str) -> Result<Self, JobError> {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(other) => Err(JobError::malformed(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(JobError::malformed(format!("json decode: {e}"))),
        }
    }

    pub fn job(&self) -> Option<&str> {
        self.fields.get(JOB).and_then(Value::as_str)
    }

    /// Application payload; `Value::Null` when absent.
    pub fn data(&self) -> &Value {
        self.fields.get(DATA).unwrap_or(&Value::Null)
    }

    /// Attempt counter. Absent, non-numeric or non-positive values count as 1.
    /// Integers too large for u64 saturate at `u64::MAX`.
    pub fn attempts(&self) -> u64 {
        let Some(Value::Number(n)) = self.fields.get(ATTEMPTS) else {
            return 1;
        };
        if let Some(n) = n.as_u64() {
            return n.max(1);
        }
        // serde_json は u64 を超える整数を f64 で持つ
        match n.as_f64() {
            Some(f) if f >= u64::MAX as f64 => u64::MAX,
            _ => 1,
        }
    }

    /// Logical queue name. Required for anything that will be released.
    pub fn queue(&self) -> Result<&str, JobError> {
        match self.fields.get(QUEUE) {
            Some(Value::String(queue)) => Ok(queue.as_str()),
            Some(other) => Err(JobError::malformed(format!(
                "`queue` must be a string, got {}",
                json_kind(other)
            ))),
            None => Err(JobError::malformed("missing `queue` field")),
        }
    }

    /// The payload for the next attempt: `attempts + 1`, everything else unchanged.
    pub fn next_attempt(mut self) -> Self {
        let next = self.attempts().saturating_add(1);
        self.fields.insert(ATTEMPTS.to_string(), Value::from(next));
        self
    }

    /// Encode back into a message body.
    pub fn to_body(&self) -> Result<String, JobError> {
        serde_json::to_string(self).map_err(|e| JobError::malformed(format!("json encode: {e}")))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(r#"{"job":"X","data":{}}"#, 1)]
    #[case(r#"{"job":"X","data":{},"attempts":1}"#, 1)]
    #[case(r#"{"job":"X","data":{},"attempts":7}"#, 7)]
    #[case(r#"{"job":"X","attempts":"7"}"#, 1)]
    #[case(r#"{"job":"X","attempts":null}"#, 1)]
    #[case(r#"{"job":"X","attempts":0}"#, 1)]
    #[case(r#"{"job":"X","attempts":-3}"#, 1)]
    #[case(r#"{"job":"X","attempts":2.5}"#, 1)]
    #[case(r#"{"job":"X","attempts":4294967296}"#, 4_294_967_296)]
    #[case(r#"{"job":"X","attempts":5000000000}"#, 5_000_000_000)]
    #[case(r#"{"job":"X","attempts":18446744073709551615}"#, u64::MAX)]
    #[case(r#"{"job":"X","attempts":100000000000000000000}"#, u64::MAX)]
    fn attempts_defaults_to_one(#[case] body: &str, #[case] expected: u64) {
        let payload = Payload::parse(body).unwrap();
        assert_eq!(payload.attempts(), expected);
    }

    #[rstest]
    #[case("default")]
    #[case("emails-high")]
    #[case("")]
    fn queue_is_returned_verbatim(#[case] queue: &str) {
        let body = json!({ "job": "X", "data": {}, "queue": queue }).to_string();
        let payload = Payload::parse(&body).unwrap();
        assert_eq!(payload.queue().unwrap(), queue);
    }

    #[test]
    fn missing_queue_is_malformed() {
        let payload = Payload::parse(r#"{"job":"X","data":{}}"#).unwrap();
        let err = payload.queue().unwrap_err();
        assert!(matches!(err, JobError::MalformedPayload { .. }));
    }

    #[test]
    fn non_string_queue_is_malformed() {
        let payload = Payload::parse(r#"{"queue":5}"#).unwrap();
        assert!(matches!(
            payload.queue(),
            Err(JobError::MalformedPayload { .. })
        ));
    }

    #[rstest]
    #[case("not json")]
    #[case("[1,2,3]")]
    #[case("\"default\"")]
    #[case("")]
    fn non_object_bodies_are_malformed(#[case] body: &str) {
        let err = Payload::parse(body).unwrap_err();
        assert!(matches!(err, JobError::MalformedPayload { .. }));
    }

    #[test]
    fn next_attempt_preserves_field_order() {
        let payload =
            Payload::parse(r#"{"job":"X","data":{},"attempts":2,"queue":"default"}"#).unwrap();
        let body = payload.next_attempt().to_body().unwrap();
        assert_eq!(body, r#"{"job":"X","data":{},"attempts":3,"queue":"default"}"#);
    }

    #[test]
    fn next_attempt_appends_missing_counter() {
        let payload = Payload::parse(r#"{"job":"X","data":{"a":1},"queue":"q","extra":[1]}"#)
            .unwrap();
        let body = payload.next_attempt().to_body().unwrap();
        assert_eq!(
            body,
            r#"{"job":"X","data":{"a":1},"queue":"q","extra":[1],"attempts":2}"#
        );
    }

    #[rstest]
    #[case(r#"{"attempts":4294967295,"queue":"q"}"#, r#"{"attempts":4294967296,"queue":"q"}"#)]
    #[case(r#"{"attempts":5000000000,"queue":"q"}"#, r#"{"attempts":5000000001,"queue":"q"}"#)]
    #[case(
        r#"{"attempts":18446744073709551615,"queue":"q"}"#,
        r#"{"attempts":18446744073709551615,"queue":"q"}"#
    )]
    fn next_attempt_never_goes_backwards(#[case] body: &str, #[case] expected: &str) {
        let payload = Payload::parse(body).unwrap();
        let before = payload.attempts();
        let next = payload.next_attempt();
        assert!(next.attempts() >= before);
        assert_eq!(next.to_body().unwrap(), expected);
    }

    #[test]
    fn new_payload_has_no_attempts_field() {
        let payload = Payload::new("SendEmail", json!({ "to": "a@b.c" }), "mail");
        assert_eq!(payload.job(), Some("SendEmail"));
        assert_eq!(payload.data(), &json!({ "to": "a@b.c" }));
        assert_eq!(payload.queue().unwrap(), "mail");
        assert!(payload.get("attempts").is_none());
        assert_eq!(payload.attempts(), 1);
    }
}
