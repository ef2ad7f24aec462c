// verdict-seal-core/src/runtime/engine.rs
// ============================================================================
// Module: Verdict Seal Evaluation Engine
// Description: The deterministic ten-step seal pipeline.
// Purpose: Turn a validated request into a sealed, content-addressed result.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The engine is the single canonical execution path: fresh evaluation and
//! replay both call [`run_evaluation`], so determinism holds by construction
//! rather than by parallel maintenance. The step order is part of the
//! contract — every intermediate state flows into the trace, and the trace
//! participates in the output digest.
//!
//! The engine is pure. Same input, same bytes out, regardless of process,
//! thread, or host.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

use crate::core::codec::CodecError;
use crate::core::codec::canonical_json_bytes;
use crate::core::codec::sha256_hex;
use crate::core::evaluation::Decision;
use crate::core::evaluation::EvaluationRequest;
use crate::core::evaluation::EvaluationResult;
use crate::core::evaluation::TraceStatus;
use crate::core::evaluation::TraceStep;
use crate::core::identifiers::EvaluationId;
use crate::core::identifiers::PolicyId;
use crate::core::invariants::InvariantViolation;
use crate::core::invariants::check_during_invariants;
use crate::core::invariants::check_post_invariants;
use crate::core::invariants::check_pre_invariants;
use crate::core::policy::DEFAULT_POLICY_ID;
use crate::core::policy::Policy;
use crate::core::policy::PolicyError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors aborting an evaluation before any artifact is written.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An invariant check failed; fail-closed.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    /// The requested policy is not registered.
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// Canonical serialization failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

// ============================================================================
// SECTION: Output Projection
// ============================================================================

/// The projection hashed to produce `output_sha256`.
///
/// # Invariants
/// - `trace` is the trace as it stands before the `compute_output_hash` step
///   is appended; hashing later steps would make the digest self-referential.
#[derive(Serialize)]
struct OutputForHash<'a> {
    /// Evaluation identifier.
    evaluation_id: &'a EvaluationId,
    /// Canonical input digest.
    input_sha256: &'a str,
    /// Policy that produced the verdict.
    policy_id: &'a PolicyId,
    /// Final decision.
    decision: Decision,
    /// Decision reasons.
    reasons: &'a [String],
    /// Trace snapshot at hashing time.
    trace: &'a [TraceStep],
    /// Caller-injected timestamp echoed into the result.
    created_time_utc: &'a str,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Runs the deterministic evaluation pipeline on a validated request.
///
/// Returns the sealed result (with `manifest_sha256` left empty for the
/// store to fill) together with the canonical input digest.
///
/// # Errors
///
/// Returns [`EngineError`] when a policy cannot be resolved, an invariant is
/// violated, or canonical serialization fails. No artifact is written in any
/// of these cases.
pub fn run_evaluation(
    request: &EvaluationRequest,
    policy_id: Option<&PolicyId>,
) -> Result<(EvaluationResult, String), EngineError> {
    let policy_id = policy_id.cloned().unwrap_or_else(|| PolicyId::new(DEFAULT_POLICY_ID));
    let policy = Policy::resolve(&policy_id)?;

    let mut trace = vec![TraceStep::new(
        "load_policy",
        TraceStatus::Pass,
        format!("Loaded policy: {policy_id}"),
    )];

    for check in check_pre_invariants(request)? {
        trace.push(TraceStep::new(
            format!("pre_{}", check.name),
            check.status,
            format!("PRE invariant check: {}", check.name),
        ));
    }

    let input_bytes = canonical_json_bytes(request)?;
    let input_sha256 = sha256_hex(&input_bytes);
    trace.push(TraceStep::new(
        "canonicalize_input",
        TraceStatus::Pass,
        format!("Input canonicalized, sha256={input_sha256}"),
    ));

    let evaluation_id = EvaluationId::from_input_digest(&input_sha256);
    trace.push(TraceStep::new(
        "derive_evaluation_id",
        TraceStatus::Pass,
        format!("evaluation_id={evaluation_id}"),
    ));

    for check in check_during_invariants() {
        trace.push(TraceStep::new(
            format!("during_{}", check.name),
            check.status,
            format!("DURING invariant check: {}", check.name),
        ));
    }

    let verdict = policy.evaluate(&request.payload);
    for entry in &verdict.rule_trace {
        trace.push(TraceStep::new(
            format!("rule_{}_{}", entry.rule_id, entry.rule_name),
            entry.status,
            entry.detail.clone(),
        ));
    }
    trace.push(TraceStep::new(
        "policy_evaluation_complete",
        TraceStatus::Pass,
        format!(
            "Policy {policy_id} applied: decision={}, reasons_count={}",
            verdict.decision.as_str(),
            verdict.reasons.len()
        ),
    ));

    let output_bytes = canonical_json_bytes(&OutputForHash {
        evaluation_id: &evaluation_id,
        input_sha256: &input_sha256,
        policy_id: &policy_id,
        decision: verdict.decision,
        reasons: &verdict.reasons,
        trace: &trace,
        created_time_utc: &request.injected_time_utc,
    })?;
    let output_sha256 = sha256_hex(&output_bytes);
    trace.push(TraceStep::new(
        "compute_output_hash",
        TraceStatus::Pass,
        format!("output_sha256={output_sha256}"),
    ));

    let mut result = EvaluationResult {
        evaluation_id,
        input_sha256: input_sha256.clone(),
        output_sha256,
        manifest_sha256: String::new(),
        policy_id,
        decision: verdict.decision,
        reasons: verdict.reasons,
        trace,
        created_time_utc: request.injected_time_utc.clone(),
    };

    for check in check_post_invariants(&result, &input_sha256)? {
        result.trace.push(TraceStep::new(
            format!("post_{}", check.name),
            check.status,
            format!("POST invariant check: {}", check.name),
        ));
    }

    Ok((result, input_sha256))
}

/// Runs the pipeline and returns only the determinism triple.
///
/// Convenience for determinism checks: `(evaluation_id, input_sha256,
/// output_sha256)`.
///
/// # Errors
///
/// Returns [`EngineError`] under the same conditions as [`run_evaluation`].
pub fn run_pure_evaluation(
    request: &EvaluationRequest,
) -> Result<(EvaluationId, String, String), EngineError> {
    let (result, input_sha256) = run_evaluation(request, None)?;
    Ok((result.evaluation_id, input_sha256, result.output_sha256))
}
