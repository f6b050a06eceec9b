//! JSON wire codec for persisted and exported assessments.
//!
//! # Responsibility
//! - Encode/decode `Assessment` to the camelCase JSON document shape.
//! - Encode timestamps as RFC 3339 strings and revive them leniently.
//!
//! # Invariants
//! - Malformed or missing timestamps never fail decoding; they fall back to
//!   the current time.
//! - `decode(encode(a)) == a` for every assessment.

use crate::model::assessment::Assessment;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Wire codec failure.
#[derive(Debug)]
pub enum CodecError {
    /// JSON syntax error or document shape mismatch.
    Json(serde_json::Error),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid assessment document: {err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Encodes an assessment into a JSON value.
pub fn encode(assessment: &Assessment) -> Result<Value, CodecError> {
    Ok(serde_json::to_value(assessment)?)
}

/// Encodes an assessment into an indented JSON document.
pub fn encode_pretty(assessment: &Assessment) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(assessment)?)
}

/// Decodes an assessment from a JSON value.
///
/// The result is structurally decoded only; callers loading untrusted blobs
/// should pass it through `service::integrity::sanitize`.
pub fn decode(value: Value) -> Result<Assessment, CodecError> {
    Ok(serde_json::from_value(value)?)
}

/// Decodes an assessment from JSON text.
pub fn decode_str(text: &str) -> Result<Assessment, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Serde adapter: RFC 3339 on write, lenient revival on read.
pub mod lenient_timestamp {
    use jiff::Timestamp;
    use log::warn;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(revive(&raw))
    }

    /// Parses an RFC 3339 string or epoch milliseconds, else returns now.
    pub fn revive(raw: &Value) -> Timestamp {
        let parsed = match raw {
            Value::String(text) => text.trim().parse::<Timestamp>().ok(),
            Value::Number(number) => number
                .as_i64()
                .and_then(|millis| Timestamp::from_millisecond(millis).ok()),
            _ => None,
        };
        parsed.unwrap_or_else(|| {
            warn!("event=timestamp_revive module=codec status=fallback reason=malformed");
            Timestamp::now()
        })
    }
}
