// verdict-seal-core/src/runtime/replay.rs
// ============================================================================
// Module: Verdict Seal Replay Engine
// Description: Re-executes stored evaluations and reports mismatches.
// Purpose: Prove byte-exact determinism of committed evaluations.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! Replay loads the stored triple (input, output, manifest), re-parses the
//! input through the same schema, re-runs the same engine with the policy id
//! recorded in the stored output, and compares the recomputed values against
//! the stored ones as discrete checks. A mismatch is data, not an error:
//! tamper is a normal outcome this system exists to report.
//!
//! Tamper semantics: the engine regenerates reasons, trace, and
//! `created_time_utc` from the input, so tampering only those fields inside
//! `output.json` is not itself flagged — but any tamper that changes the
//! bytes feeding `output_sha256` (including `input.json` itself) is
//! detected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::core::evaluation::ReplayVerdict;
use crate::core::identifiers::PolicyId;
use crate::core::policy::LEGACY_POLICY_ID;
use crate::core::schema::parse_request;
use crate::runtime::engine::run_evaluation;
use crate::runtime::store::ArtifactStore;
use crate::runtime::store::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Replay failures that prevent producing a verdict.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// No committed evaluation directory exists for the id.
    #[error("Evaluation not found: {0}")]
    NotFound(String),
    /// A required artifact is absent from a committed evaluation.
    #[error("{file} not found for: {evaluation_id}")]
    MissingArtifact {
        /// File name of the absent artifact.
        file: &'static str,
        /// Evaluation identifier.
        evaluation_id: String,
    },
    /// The store failed while loading artifacts.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Replay
// ============================================================================

/// Replays a committed evaluation and verifies determinism.
///
/// # Errors
///
/// Returns [`ReplayError`] when the evaluation or one of its artifacts does
/// not exist, or when the store fails. Mismatches are not errors; they are
/// reported in the returned [`ReplayVerdict`].
pub fn replay_evaluation(
    store: &ArtifactStore,
    evaluation_id: &str,
) -> Result<ReplayVerdict, ReplayError> {
    if !store.exists(evaluation_id) {
        return Err(ReplayError::NotFound(evaluation_id.to_string()));
    }

    let saved_input = store.load_input(evaluation_id)?.ok_or(ReplayError::MissingArtifact {
        file: "input.json",
        evaluation_id: evaluation_id.to_string(),
    })?;
    let saved_output = store.load_output(evaluation_id)?.ok_or(ReplayError::MissingArtifact {
        file: "output.json",
        evaluation_id: evaluation_id.to_string(),
    })?;
    let _saved_manifest =
        store.load_manifest(evaluation_id)?.ok_or(ReplayError::MissingArtifact {
            file: "manifest.json",
            evaluation_id: evaluation_id.to_string(),
        })?;

    let request = match parse_request(&saved_input) {
        Ok(request) => request,
        Err(err) => {
            return Ok(ReplayVerdict {
                replay_ok: false,
                mismatches: vec![format!("Failed to parse saved input: {err}")],
            });
        }
    };

    let saved_policy_id = saved_output
        .get("policy_id")
        .and_then(Value::as_str)
        .map_or_else(|| PolicyId::new(LEGACY_POLICY_ID), PolicyId::new);

    let (new_result, _new_input_sha256) = match run_evaluation(&request, Some(&saved_policy_id)) {
        Ok(outcome) => outcome,
        Err(err) => {
            return Ok(ReplayVerdict {
                replay_ok: false,
                mismatches: vec![format!("Failed to re-evaluate saved input: {err}")],
            });
        }
    };

    let mut mismatches = Vec::new();

    if new_result.evaluation_id.as_str() != evaluation_id {
        mismatches.push(format!(
            "evaluation_id mismatch: expected={evaluation_id}, got={}",
            new_result.evaluation_id
        ));
    }

    let saved_input_sha256 = saved_field(&saved_output, "input_sha256");
    if new_result.input_sha256 != saved_input_sha256 {
        mismatches.push(format!(
            "input_sha256 mismatch: saved={saved_input_sha256}, replayed={}",
            new_result.input_sha256
        ));
    }

    let saved_output_sha256 = saved_field(&saved_output, "output_sha256");
    if new_result.output_sha256 != saved_output_sha256 {
        mismatches.push(format!(
            "output_sha256 mismatch: saved={saved_output_sha256}, replayed={}",
            new_result.output_sha256
        ));
    }

    let saved_decision = saved_field(&saved_output, "decision");
    if new_result.decision.as_str() != saved_decision {
        mismatches.push(format!(
            "decision mismatch: saved={saved_decision}, replayed={}",
            new_result.decision.as_str()
        ));
    }

    if new_result.policy_id != saved_policy_id {
        mismatches.push(format!(
            "policy_id mismatch: saved={saved_policy_id}, replayed={}",
            new_result.policy_id
        ));
    }

    Ok(ReplayVerdict {
        replay_ok: mismatches.is_empty(),
        mismatches,
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a string field from the saved output, rendering absence explicitly.
fn saved_field(saved_output: &Value, field: &str) -> String {
    saved_output
        .get(field)
        .and_then(Value::as_str)
        .map_or_else(|| "<missing>".to_string(), ToString::to_string)
}
