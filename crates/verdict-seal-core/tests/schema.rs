// verdict-seal-core/tests/schema.rs
// ============================================================================
// Module: Schema Tests
// Description: Tests for strict request validation.
// Purpose: Pin the rejection matrix at the wire trust boundary.
// Dependencies: verdict-seal-core, serde_json
// ============================================================================
//! ## Overview
//! Validates the closed request shape: required fields, forbidden extras,
//! type errors with paths, label bounds, timestamp shape, and hostile
//! payload handling.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use serde_json::Value;
use serde_json::json;
use verdict_seal_core::SchemaErrorKind;
use verdict_seal_core::is_utc_timestamp_shaped;
use verdict_seal_core::parse_request;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// A minimal valid request body.
fn valid_body() -> Value {
    json!({
        "version": "v1",
        "subject": "s",
        "ruleset": "r",
        "payload": {"decision_requested": "ACCEPT", "justification": "ok"},
        "injected_time_utc": "2024-01-01T00:00:00Z"
    })
}

// ============================================================================
// SECTION: Accepted Shapes
// ============================================================================

/// A well-formed request parses into the typed form.
#[test]
fn valid_request_parses() {
    let request = parse_request(&valid_body()).unwrap();
    assert_eq!(request.version, "v1");
    assert_eq!(request.subject, "s");
    assert_eq!(request.ruleset, "r");
    assert_eq!(request.injected_time_utc, "2024-01-01T00:00:00Z");
}

/// Deeply nested payloads with every JSON type are accepted.
#[test]
fn nested_payload_is_accepted() {
    let mut body = valid_body();
    body["payload"] = json!({
        "a": {"b": [1, 2.5, "x", true, null, {"c": []}]},
        "unicode": "héllo"
    });
    assert!(parse_request(&body).is_ok());
}

/// Timestamps with fractions and numeric offsets are accepted.
#[test]
fn timestamp_variants_are_accepted() {
    for stamp in [
        "2024-01-01T00:00:00Z",
        "2024-01-01T00:00:00.5Z",
        "2024-01-01T00:00:00.123456Z",
        "2024-01-01T00:00:00+05:30",
        "2024-01-01T00:00:00.1-08:00",
    ] {
        assert!(is_utc_timestamp_shaped(stamp), "expected shape match: {stamp}");
        let mut body = valid_body();
        body["injected_time_utc"] = json!(stamp);
        assert!(parse_request(&body).is_ok(), "expected accept: {stamp}");
    }
}

// ============================================================================
// SECTION: Rejected Shapes
// ============================================================================

/// Each required field is reported as missing with its name.
#[test]
fn missing_fields_are_reported() {
    for field in ["version", "subject", "ruleset", "payload", "injected_time_utc"] {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove(field);
        let err = parse_request(&body).unwrap_err();
        assert!(
            err.errors
                .iter()
                .any(|e| e.field == field && e.kind == SchemaErrorKind::Missing),
            "expected missing error for {field}: {err:?}"
        );
    }
}

/// Unknown top-level fields are forbidden.
#[test]
fn extra_fields_are_forbidden() {
    let mut body = valid_body();
    body["surprise"] = json!(1);
    let err = parse_request(&body).unwrap_err();
    assert!(
        err.errors
            .iter()
            .any(|e| e.field == "surprise" && e.kind == SchemaErrorKind::ExtraForbidden)
    );
}

/// Wrong scalar types are reported with the field path.
#[test]
fn wrong_types_are_reported() {
    let mut body = valid_body();
    body["subject"] = json!(7);
    body["payload"] = json!("not-an-object");
    let err = parse_request(&body).unwrap_err();
    assert!(
        err.errors
            .iter()
            .any(|e| e.field == "subject" && e.kind == SchemaErrorKind::WrongType)
    );
    assert!(
        err.errors
            .iter()
            .any(|e| e.field == "payload" && e.kind == SchemaErrorKind::WrongType)
    );
}

/// The version literal is pinned to v1.
#[test]
fn version_must_be_v1() {
    let mut body = valid_body();
    body["version"] = json!("v2");
    let err = parse_request(&body).unwrap_err();
    assert!(
        err.errors
            .iter()
            .any(|e| e.field == "version" && e.kind == SchemaErrorKind::InvalidValue)
    );
}

/// Labels are bounded to 1..=128 characters.
#[test]
fn label_bounds_are_enforced() {
    let mut body = valid_body();
    body["subject"] = json!("");
    let err = parse_request(&body).unwrap_err();
    assert!(err.errors.iter().any(|e| e.field == "subject"));

    let mut body = valid_body();
    body["ruleset"] = json!("r".repeat(129));
    let err = parse_request(&body).unwrap_err();
    assert!(err.errors.iter().any(|e| e.field == "ruleset"));

    let mut body = valid_body();
    body["subject"] = json!("s".repeat(128));
    assert!(parse_request(&body).is_ok());
}

/// Malformed timestamps are rejected as invalid values.
#[test]
fn malformed_timestamps_are_rejected() {
    for stamp in [
        "2024-01-01",
        "2024-01-01 00:00:00Z",
        "2024-01-01T00:00:00",
        "2024-01-01T00:00:00.Z",
        "2024-01-01T00:00:00+0530",
        "not a time",
        "",
    ] {
        assert!(!is_utc_timestamp_shaped(stamp), "expected shape reject: {stamp}");
        let mut body = valid_body();
        body["injected_time_utc"] = json!(stamp);
        let err = parse_request(&body).unwrap_err();
        assert!(
            err.errors.iter().any(|e| e.field == "injected_time_utc"),
            "expected reject: {stamp}"
        );
    }
}

/// A non-object request body is rejected outright.
#[test]
fn non_object_body_is_rejected() {
    let err = parse_request(&json!([1, 2, 3])).unwrap_err();
    assert_eq!(err.errors.len(), 1);
    assert_eq!(err.errors[0].kind, SchemaErrorKind::WrongType);
}

/// Validation collects every offending field, not just the first.
#[test]
fn all_errors_are_collected() {
    let body = json!({"version": "v9", "subject": "", "extra": 1});
    let err = parse_request(&body).unwrap_err();
    let fields: Vec<&str> = err.errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"version"));
    assert!(fields.contains(&"subject"));
    assert!(fields.contains(&"extra"));
    assert!(fields.contains(&"ruleset"));
    assert!(fields.contains(&"payload"));
    assert!(fields.contains(&"injected_time_utc"));
}

// ============================================================================
// SECTION: Hostile Payloads
// ============================================================================

/// The JSON value model cannot represent NaN or Infinity: the literal is
/// rejected at the parse boundary, before the schema ever runs.
#[test]
fn nan_literal_never_reaches_the_schema() {
    assert!(serde_json::from_str::<Value>(r#"{"v": NaN}"#).is_err());
    assert!(serde_json::from_str::<Value>(r#"{"v": Infinity}"#).is_err());
    assert!(serde_json::from_str::<Value>(r#"{"v": -Infinity}"#).is_err());
}

/// Payload keys may be hostile strings; they are carried verbatim.
#[test]
fn hostile_payload_keys_are_accepted_verbatim() {
    let mut body = valid_body();
    body["payload"] = json!({
        "": 1,
        "key with spaces": 2,
        "ключ": 3,
        "\u{0001}": 4
    });
    assert!(parse_request(&body).is_ok());
}
