// verdict-seal-core/src/core/evaluation.rs
// ============================================================================
// Module: Verdict Seal Evaluation Records
// Description: Request, result, trace, manifest, and metadata structures.
// Purpose: Provide the canonical serializable types for the seal pipeline.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! These types are the canonical source of truth for every persisted artifact
//! and every wire surface. Field names are wire names: the canonical bytes of
//! a record are computed directly over its serde form, so renaming a field is
//! a breaking change to every stored digest.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::EvaluationId;
use crate::core::identifiers::PolicyId;

// ============================================================================
// SECTION: Request
// ============================================================================

/// A decision request accepted by the seal pipeline.
///
/// # Invariants
/// - Immutable once accepted; the canonical bytes of this value are the
///   content address of the evaluation.
/// - `payload` contains only JSON object/array/string/bool/number/null values
///   with string keys and finite numbers (enforced by the schema layer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationRequest {
    /// Request schema version; must equal `"v1"`.
    pub version: String,
    /// Subject the decision concerns (1..=128 chars).
    pub subject: String,
    /// Ruleset label supplied by the caller (1..=128 chars).
    pub ruleset: String,
    /// Free-form JSON object evaluated by the policy.
    pub payload: Map<String, Value>,
    /// Caller-injected UTC timestamp; the core never reads a clock.
    pub injected_time_utc: String,
}

// ============================================================================
// SECTION: Trace
// ============================================================================

/// Status of a single trace step or rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceStatus {
    /// The step succeeded.
    Pass,
    /// The step failed.
    Fail,
}

impl TraceStatus {
    /// Returns the wire form of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

/// One ordered step in an evaluation trace.
///
/// # Invariants
/// - Step order is part of the output digest; reordering is a defect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    /// Stable step name, e.g. `pre_version_check` or `rule_R001_...`.
    pub step_name: String,
    /// Step status.
    pub status: TraceStatus,
    /// Human-readable step detail.
    pub details: String,
}

impl TraceStep {
    /// Creates a new trace step.
    #[must_use]
    pub fn new(
        step_name: impl Into<String>,
        status: TraceStatus,
        details: impl Into<String>,
    ) -> Self {
        Self {
            step_name: step_name.into(),
            status,
            details: details.into(),
        }
    }
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Final verdict of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// The request is accepted.
    Accept,
    /// The request is rejected.
    Reject,
}

impl Decision {
    /// Returns the wire form of the decision.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "ACCEPT",
            Self::Reject => "REJECT",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Result
// ============================================================================

/// The sealed outcome of one evaluation.
///
/// # Invariants
/// - `evaluation_id` equals the first 16 hex chars of `input_sha256`.
/// - `reasons` is non-empty.
/// - `created_time_utc` equals the request's `injected_time_utc`.
/// - `manifest_sha256` is empty until the store commits the evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Content-derived evaluation identifier.
    pub evaluation_id: EvaluationId,
    /// Digest of the canonical request bytes.
    pub input_sha256: String,
    /// Digest of the canonical output-for-hash projection.
    pub output_sha256: String,
    /// Digest of the canonical manifest; empty before storage.
    pub manifest_sha256: String,
    /// Identifier of the policy that produced the verdict.
    pub policy_id: PolicyId,
    /// Final verdict.
    pub decision: Decision,
    /// Non-empty list of human-readable reasons.
    pub reasons: Vec<String>,
    /// Ordered execution trace.
    pub trace: Vec<TraceStep>,
    /// Echo of the caller-injected timestamp.
    pub created_time_utc: String,
}

// ============================================================================
// SECTION: Manifest
// ============================================================================

/// Digest and size of one persisted artifact file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFileEntry {
    /// Path relative to the evaluation directory.
    pub path: String,
    /// Digest of the persisted file bytes.
    pub sha256: String,
    /// Size of the persisted file in bytes.
    pub size: u64,
}

/// Content-addressed index of the files sealed for one evaluation.
///
/// # Invariants
/// - `files` is ordered input.json, output.json, trace.json.
/// - The manifest digest is computed over the canonical bytes of this value
///   with `manifest_sha256` absent; the persisted copy then embeds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Evaluation this manifest belongs to.
    pub evaluation_id: EvaluationId,
    /// Ordered file digest entries.
    pub files: Vec<ManifestFileEntry>,
    /// Digest of this manifest's canonical bytes without this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_sha256: Option<String>,
}

// ============================================================================
// SECTION: Metadata
// ============================================================================

/// Denormalized index record persisted beside the sealed artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationMetadata {
    /// Evaluation identifier.
    pub evaluation_id: EvaluationId,
    /// Caller-injected timestamp.
    pub injected_time_utc: String,
    /// Request subject.
    pub subject: String,
    /// Request ruleset label.
    pub ruleset: String,
    /// Digest of the canonical request bytes.
    pub input_sha256: String,
    /// Digest of the canonical output projection.
    pub output_sha256: String,
    /// Digest of the persisted trace file.
    pub trace_sha256: String,
    /// Digest of the canonical manifest.
    pub manifest_sha256: String,
}

// ============================================================================
// SECTION: Replay Verdict
// ============================================================================

/// Outcome of replaying a stored evaluation.
///
/// A failed replay is data, not an error: tamper is a normal outcome this
/// system exists to report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayVerdict {
    /// True when every comparison matched.
    pub replay_ok: bool,
    /// Human-readable mismatch descriptions; empty when `replay_ok`.
    pub mismatches: Vec<String>,
}
