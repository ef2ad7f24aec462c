// verdict-seal-core/tests/engine.rs
// ============================================================================
// Module: Engine Tests
// Description: Tests for the deterministic evaluation pipeline.
// Purpose: Pin step order, id derivation, and the output hash rule.
// Dependencies: verdict-seal-core, serde_json
// ============================================================================
//! ## Overview
//! Validates the determinism triple across repeated runs, key-order
//! invariance of the content address, the exact trace step sequence, and
//! the rule that `output_sha256` is computed before the
//! `compute_output_hash` step is appended.

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
use verdict_seal_core::Decision;
use verdict_seal_core::EvaluationRequest;
use verdict_seal_core::LEGACY_POLICY_ID;
use verdict_seal_core::PolicyId;
use verdict_seal_core::canonical_json_bytes;
use verdict_seal_core::run_evaluation;
use verdict_seal_core::run_pure_evaluation;
use verdict_seal_core::sha256_hex;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a request with the given payload object.
fn request_with_payload(payload: Value) -> EvaluationRequest {
    EvaluationRequest {
        version: "v1".to_string(),
        subject: "s".to_string(),
        ruleset: "r".to_string(),
        payload: payload.as_object().unwrap().clone(),
        injected_time_utc: "2024-01-01T00:00:00Z".to_string(),
    }
}

/// The canonical ACCEPT request from the default-policy scenario.
fn accept_request() -> EvaluationRequest {
    request_with_payload(json!({"decision_requested": "ACCEPT", "justification": "ok"}))
}

// ============================================================================
// SECTION: Determinism
// ============================================================================

/// Repeated evaluation produces the identical determinism triple.
#[test]
fn repeated_runs_are_identical() {
    let request = accept_request();
    let first = run_pure_evaluation(&request).unwrap();
    let second = run_pure_evaluation(&request).unwrap();
    assert_eq!(first, second);
}

/// The evaluation id is the first sixteen hex chars of the input digest.
#[test]
fn evaluation_id_is_digest_prefix() {
    let request = accept_request();
    let (result, input_sha256) = run_evaluation(&request, None).unwrap();
    assert_eq!(result.evaluation_id.as_str(), &input_sha256[..16]);
    assert_eq!(result.input_sha256, input_sha256);
    assert_eq!(input_sha256, sha256_hex(&canonical_json_bytes(&request).unwrap()));
}

/// Payload key order never changes the content address.
#[test]
fn payload_key_order_is_invariant() {
    let first =
        request_with_payload(json!({"decision_requested": "ACCEPT", "justification": "ok"}));
    let second =
        request_with_payload(json!({"justification": "ok", "decision_requested": "ACCEPT"}));

    let (result_a, _) = run_evaluation(&first, None).unwrap();
    let (result_b, _) = run_evaluation(&second, None).unwrap();
    assert_eq!(result_a.evaluation_id, result_b.evaluation_id);
    assert_eq!(result_a.output_sha256, result_b.output_sha256);
}

/// Distinct requests produce distinct content addresses.
#[test]
fn distinct_requests_have_distinct_ids() {
    let first = request_with_payload(json!({"decision_requested": "ACCEPT", "justification": "a"}));
    let second =
        request_with_payload(json!({"decision_requested": "ACCEPT", "justification": "b"}));

    let (result_a, _) = run_evaluation(&first, None).unwrap();
    let (result_b, _) = run_evaluation(&second, None).unwrap();
    assert_ne!(result_a.evaluation_id, result_b.evaluation_id);
}

// ============================================================================
// SECTION: Scenario Outcomes
// ============================================================================

/// The default-policy ACCEPT scenario seals an ACCEPT with an R005 reason.
#[test]
fn default_policy_accept_scenario() {
    let (result, _) = run_evaluation(&accept_request(), None).unwrap();
    assert_eq!(result.decision, Decision::Accept);
    assert!(result.reasons.iter().any(|reason| reason.contains("R005")));
    assert_eq!(result.created_time_utc, "2024-01-01T00:00:00Z");
    assert_eq!(result.manifest_sha256, "");
    assert!(!result.reasons.is_empty());
}

/// The legacy-policy REJECT scenario names the failed assert.
#[test]
fn legacy_policy_reject_scenario() {
    let request = request_with_payload(json!({"assert": false}));
    let (result, _) =
        run_evaluation(&request, Some(&PolicyId::new(LEGACY_POLICY_ID))).unwrap();
    assert_eq!(result.decision, Decision::Reject);
    assert_eq!(result.policy_id.as_str(), LEGACY_POLICY_ID);
    assert!(result.reasons[0].contains("not true"));
}

/// An unknown policy id aborts the evaluation.
#[test]
fn unknown_policy_id_fails_closed() {
    let request = accept_request();
    assert!(run_evaluation(&request, Some(&PolicyId::new("no-such-policy"))).is_err());
}

// ============================================================================
// SECTION: Trace Contract
// ============================================================================

/// The trace step sequence is fixed and order-sensitive.
#[test]
fn trace_step_order_is_fixed() {
    let (result, _) = run_evaluation(&accept_request(), None).unwrap();
    let names: Vec<&str> = result.trace.iter().map(|step| step.step_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "load_policy",
            "pre_version_check",
            "pre_subject_check",
            "pre_ruleset_check",
            "pre_injected_time_check",
            "pre_payload_type_check",
            "pre_no_extra_fields_check",
            "canonicalize_input",
            "derive_evaluation_id",
            "during_no_system_clock_read",
            "during_artifact_dir_only",
            "rule_R001_check_decision_requested_present",
            "rule_R002_check_decision_requested_valid",
            "rule_R003_check_justification_present",
            "rule_R004_check_justification_non_empty",
            "rule_R005_apply_decision",
            "policy_evaluation_complete",
            "compute_output_hash",
            "post_input_hash_format",
            "post_output_hash_format",
            "post_evaluation_id_derivation",
            "post_reasons_non_empty",
            "post_decision_valid",
            "post_trace_deterministic",
            "post_canonicalization_stable",
        ]
    );
}

/// `output_sha256` covers the trace exactly as it stood before the
/// `compute_output_hash` step was appended.
#[test]
fn output_hash_covers_trace_snapshot() {
    let (result, input_sha256) = run_evaluation(&accept_request(), None).unwrap();

    let hash_step_index = result
        .trace
        .iter()
        .position(|step| step.step_name == "compute_output_hash")
        .unwrap();
    let snapshot = &result.trace[..hash_step_index];

    let projection = json!({
        "evaluation_id": result.evaluation_id.as_str(),
        "input_sha256": input_sha256,
        "policy_id": result.policy_id.as_str(),
        "decision": result.decision.as_str(),
        "reasons": &result.reasons,
        "trace": snapshot,
        "created_time_utc": &result.created_time_utc,
    });
    let recomputed = sha256_hex(&canonical_json_bytes(&projection).unwrap());
    assert_eq!(result.output_sha256, recomputed);
}
