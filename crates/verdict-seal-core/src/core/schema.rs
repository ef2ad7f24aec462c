// verdict-seal-core/src/core/schema.rs
// ============================================================================
// Module: Verdict Seal Request Schema
// Description: Strict validation of untyped JSON into evaluation requests.
// Purpose: Reject malformed requests with structured, path-addressed errors.
// Dependencies: crate::core::evaluation, serde_json
// ============================================================================

//! ## Overview
//! The schema layer is the trust boundary between wire bytes and the engine.
//! Unknown fields are forbidden, string bounds are enforced, the injected
//! timestamp must match the canonical shape, and the payload is recursively
//! checked so only plain JSON values with finite numbers reach the engine.
//! Every offending field is reported with its path, an error kind, and a
//! human-readable message; validation collects all errors rather than
//! stopping at the first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::evaluation::EvaluationRequest;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Required version literal for v1 requests.
pub const REQUEST_VERSION: &str = "v1";

/// Maximum length of the `subject` and `ruleset` fields.
pub const MAX_LABEL_LEN: usize = 128;

/// The closed set of request fields, in wire order.
const REQUEST_FIELDS: [&str; 5] =
    ["version", "subject", "ruleset", "payload", "injected_time_utc"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Classification of a single field validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaErrorKind {
    /// A required field is absent.
    Missing,
    /// A field outside the closed request shape is present.
    ExtraForbidden,
    /// A field has the wrong JSON type.
    WrongType,
    /// A field has the right type but an invalid value.
    InvalidValue,
}

impl SchemaErrorKind {
    /// Returns the wire form of the error kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::ExtraForbidden => "extra_forbidden",
            Self::WrongType => "wrong_type",
            Self::InvalidValue => "invalid_value",
        }
    }
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field-level validation failure with its path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path of the offending field, e.g. `payload.v`.
    pub field: String,
    /// Error classification.
    pub kind: SchemaErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    fn new(field: impl Into<String>, kind: SchemaErrorKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.field, self.kind, self.message)
    }
}

/// Structured request validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request validation failed with {} error(s)", .errors.len())]
pub struct SchemaError {
    /// Every offending field, in encounter order.
    pub errors: Vec<FieldError>,
}

// ============================================================================
// SECTION: Request Parsing
// ============================================================================

/// Validates an untyped JSON value against the request shape.
///
/// # Errors
///
/// Returns [`SchemaError`] listing every offending field when the value does
/// not satisfy the request schema.
pub fn parse_request(value: &Value) -> Result<EvaluationRequest, SchemaError> {
    let Value::Object(object) = value else {
        return Err(SchemaError {
            errors: vec![FieldError::new(
                "",
                SchemaErrorKind::WrongType,
                "request body must be a JSON object",
            )],
        });
    };

    let mut errors = Vec::new();

    for key in object.keys() {
        if !REQUEST_FIELDS.contains(&key.as_str()) {
            errors.push(FieldError::new(
                key.clone(),
                SchemaErrorKind::ExtraForbidden,
                "extra fields are forbidden",
            ));
        }
    }

    let version = validate_version(object, &mut errors);
    let subject = validate_label(object, "subject", &mut errors);
    let ruleset = validate_label(object, "ruleset", &mut errors);
    let payload = validate_payload(object, &mut errors);
    let injected_time_utc = validate_injected_time(object, &mut errors);

    if !errors.is_empty() {
        return Err(SchemaError {
            errors,
        });
    }

    match (version, subject, ruleset, payload, injected_time_utc) {
        (
            Some(version),
            Some(subject),
            Some(ruleset),
            Some(payload),
            Some(injected_time_utc),
        ) => Ok(EvaluationRequest {
            version,
            subject,
            ruleset,
            payload,
            injected_time_utc,
        }),
        _ => Err(SchemaError {
            errors: vec![FieldError::new(
                "",
                SchemaErrorKind::InvalidValue,
                "request validation produced no typed value",
            )],
        }),
    }
}

// ============================================================================
// SECTION: Field Validators
// ============================================================================

/// Validates the `version` field.
fn validate_version(object: &Map<String, Value>, errors: &mut Vec<FieldError>) -> Option<String> {
    let value = require_string(object, "version", errors)?;
    if value == REQUEST_VERSION {
        Some(value)
    } else {
        errors.push(FieldError::new(
            "version",
            SchemaErrorKind::InvalidValue,
            format!("version must be '{REQUEST_VERSION}'"),
        ));
        None
    }
}

/// Validates a bounded label field (`subject` or `ruleset`).
fn validate_label(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let value = require_string(object, field, errors)?;
    let length = value.chars().count();
    if length == 0 || length > MAX_LABEL_LEN {
        errors.push(FieldError::new(
            field,
            SchemaErrorKind::InvalidValue,
            format!("{field} must be non-empty and max {MAX_LABEL_LEN} chars"),
        ));
        return None;
    }
    Some(value)
}

/// Validates the `payload` object recursively.
fn validate_payload(
    object: &Map<String, Value>,
    errors: &mut Vec<FieldError>,
) -> Option<Map<String, Value>> {
    let Some(value) = object.get("payload") else {
        errors.push(FieldError::new("payload", SchemaErrorKind::Missing, "field is required"));
        return None;
    };
    let Value::Object(payload) = value else {
        errors.push(FieldError::new(
            "payload",
            SchemaErrorKind::WrongType,
            "payload must be a JSON object",
        ));
        return None;
    };

    let before = errors.len();
    for (key, entry) in payload {
        validate_payload_value(entry, &format!("payload.{key}"), errors);
    }
    if errors.len() == before { Some(payload.clone()) } else { None }
}

/// Recursively validates one payload value.
///
/// Object keys are strings by construction in the JSON value model; the
/// remaining hazard is a non-finite number, which must never reach the
/// canonical codec.
fn validate_payload_value(value: &Value, path: &str, errors: &mut Vec<FieldError>) {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => {}
        Value::Number(number) => {
            if let Some(float) = number.as_f64() {
                if !float.is_finite() {
                    errors.push(FieldError::new(
                        path,
                        SchemaErrorKind::InvalidValue,
                        "NaN and Infinity are forbidden",
                    ));
                }
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                validate_payload_value(item, &format!("{path}[{index}]"), errors);
            }
        }
        Value::Object(entries) => {
            for (key, entry) in entries {
                validate_payload_value(entry, &format!("{path}.{key}"), errors);
            }
        }
    }
}

/// Validates the `injected_time_utc` field.
fn validate_injected_time(
    object: &Map<String, Value>,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let value = require_string(object, "injected_time_utc", errors)?;
    if is_utc_timestamp_shaped(&value) {
        Some(value)
    } else {
        errors.push(FieldError::new(
            "injected_time_utc",
            SchemaErrorKind::InvalidValue,
            "injected_time_utc must be RFC3339/ISO8601 format",
        ));
        None
    }
}

/// Fetches a required string field, recording missing/wrong-type errors.
fn require_string(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match object.get(field) {
        None => {
            errors.push(FieldError::new(field, SchemaErrorKind::Missing, "field is required"));
            None
        }
        Some(Value::String(value)) => Some(value.clone()),
        Some(_) => {
            errors.push(FieldError::new(
                field,
                SchemaErrorKind::WrongType,
                format!("{field} must be a string"),
            ));
            None
        }
    }
}

// ============================================================================
// SECTION: Timestamp Shape
// ============================================================================

/// Returns true when `bytes[start..start + count]` are ASCII digits.
fn digits(bytes: &[u8], start: usize, count: usize) -> bool {
    bytes.len() >= start + count && bytes[start..start + count].iter().all(u8::is_ascii_digit)
}

/// Checks the canonical timestamp shape
/// `YYYY-MM-DDTHH:MM:SS(.fraction)?(Z|±HH:MM)`.
///
/// This is a shape check, not a calendar check: the stored string is opaque
/// and participates in the content address verbatim.
#[must_use]
pub fn is_utc_timestamp_shaped(value: &str) -> bool {
    let bytes = value.as_bytes();
    let date_time_ok = digits(bytes, 0, 4)
        && bytes.get(4) == Some(&b'-')
        && digits(bytes, 5, 2)
        && bytes.get(7) == Some(&b'-')
        && digits(bytes, 8, 2)
        && bytes.get(10) == Some(&b'T')
        && digits(bytes, 11, 2)
        && bytes.get(13) == Some(&b':')
        && digits(bytes, 14, 2)
        && bytes.get(16) == Some(&b':')
        && digits(bytes, 17, 2);
    if !date_time_ok {
        return false;
    }

    let mut index = 19;
    if bytes.get(index) == Some(&b'.') {
        index += 1;
        let fraction_start = index;
        while index < bytes.len() && bytes[index].is_ascii_digit() {
            index += 1;
        }
        if index == fraction_start {
            return false;
        }
    }

    match bytes.get(index) {
        Some(b'Z') => index + 1 == bytes.len(),
        Some(b'+' | b'-') => {
            bytes.len() == index + 6
                && digits(bytes, index + 1, 2)
                && bytes[index + 3] == b':'
                && digits(bytes, index + 4, 2)
        }
        _ => false,
    }
}
