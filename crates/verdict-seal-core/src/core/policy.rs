// verdict-seal-core/src/core/policy.rs
// ============================================================================
// Module: Verdict Seal Policy Registry
// Description: Enumerated decision policies and fail-closed rule evaluation.
// Purpose: Map stable policy identifiers to pure, deterministic rule sets.
// Dependencies: crate::core::evaluation, serde, serde_json
// ============================================================================

//! ## Overview
//! Policies are a small enumerated registry keyed on a stable id string.
//! Policies are added, never mutated: replay loads the policy id recorded in
//! the stored output so past decisions stay reproducible across policy
//! evolution. Rule evaluation is sequential and fail-closed — the first
//! failing rule produces the REJECT verdict.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::evaluation::Decision;
use crate::core::evaluation::TraceStatus;
use crate::core::identifiers::PolicyId;

// ============================================================================
// SECTION: Policy Identifiers
// ============================================================================

/// Identifier of the legacy assert-check policy.
pub const LEGACY_POLICY_ID: &str = "mvp-placeholder-v0";

/// Identifier of the default decision-request policy.
pub const DEFAULT_POLICY_ID: &str = "evaluation-policy-v1";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Policy registry errors.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The policy id is not present in the registry.
    #[error("unknown policy id: {0}")]
    UnknownPolicy(String),
}

// ============================================================================
// SECTION: Rule Trace
// ============================================================================

/// One rule evaluation record emitted by a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTraceEntry {
    /// Stable rule identifier, e.g. `R001`.
    pub rule_id: String,
    /// Stable rule name, e.g. `check_decision_requested_present`.
    pub rule_name: String,
    /// Rule outcome.
    pub status: TraceStatus,
    /// Human-readable rule detail.
    pub detail: String,
}

impl RuleTraceEntry {
    /// Creates a new rule trace entry.
    fn new(rule_id: &str, rule_name: &str, status: TraceStatus, detail: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            status,
            detail: detail.into(),
        }
    }
}

/// The verdict produced by evaluating a policy over a payload.
///
/// # Invariants
/// - `reasons` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyVerdict {
    /// Final decision.
    pub decision: Decision,
    /// Non-empty reasons explaining the decision.
    pub reasons: Vec<String>,
    /// Ordered rule evaluation records.
    pub rule_trace: Vec<RuleTraceEntry>,
}

// ============================================================================
// SECTION: Policy Registry
// ============================================================================

/// The enumerated set of decision policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Legacy placeholder rule: `payload.assert == true` accepts.
    LegacyAssert,
    /// Default policy: record the requested decision when justified.
    DecisionRequestV1,
}

impl Policy {
    /// Resolves a policy id against the registry.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::UnknownPolicy`] when the id is not registered.
    pub fn resolve(policy_id: &PolicyId) -> Result<Self, PolicyError> {
        match policy_id.as_str() {
            LEGACY_POLICY_ID => Ok(Self::LegacyAssert),
            DEFAULT_POLICY_ID => Ok(Self::DecisionRequestV1),
            other => Err(PolicyError::UnknownPolicy(other.to_string())),
        }
    }

    /// Evaluates the policy over a request payload.
    ///
    /// Pure and deterministic: the same policy and payload always produce the
    /// same verdict, reasons, and rule trace.
    #[must_use]
    pub fn evaluate(&self, payload: &Map<String, Value>) -> PolicyVerdict {
        match self {
            Self::LegacyAssert => evaluate_legacy_assert(payload),
            Self::DecisionRequestV1 => evaluate_decision_request(payload),
        }
    }
}

// ============================================================================
// SECTION: Default Policy Rules
// ============================================================================

/// Evaluates the sequential R001..R005 decision-request rules.
fn evaluate_decision_request(payload: &Map<String, Value>) -> PolicyVerdict {
    let mut reasons = Vec::new();
    let mut rule_trace = Vec::new();

    let Some(decision_requested) = payload.get("decision_requested") else {
        reasons.push(
            "R001:MISSING_DECISION_REQUESTED: Required field 'decision_requested' is missing \
             from payload"
                .to_string(),
        );
        rule_trace.push(RuleTraceEntry::new(
            "R001",
            "check_decision_requested_present",
            TraceStatus::Fail,
            "payload.decision_requested not found",
        ));
        return PolicyVerdict {
            decision: Decision::Reject,
            reasons,
            rule_trace,
        };
    };
    rule_trace.push(RuleTraceEntry::new(
        "R001",
        "check_decision_requested_present",
        TraceStatus::Pass,
        format!("payload.decision_requested = {}", display_value(decision_requested)),
    ));

    let requested = match decision_requested.as_str() {
        Some("ACCEPT") => Decision::Accept,
        Some("REJECT") => Decision::Reject,
        _ => {
            let shown = display_value(decision_requested);
            reasons.push(format!(
                "R002:INVALID_DECISION_REQUESTED: Field 'decision_requested' must be exactly \
                 'ACCEPT' or 'REJECT', got '{shown}'"
            ));
            rule_trace.push(RuleTraceEntry::new(
                "R002",
                "check_decision_requested_valid",
                TraceStatus::Fail,
                format!("decision_requested = '{shown}' is not valid"),
            ));
            return PolicyVerdict {
                decision: Decision::Reject,
                reasons,
                rule_trace,
            };
        }
    };
    rule_trace.push(RuleTraceEntry::new(
        "R002",
        "check_decision_requested_valid",
        TraceStatus::Pass,
        format!("decision_requested = '{}' is valid", requested.as_str()),
    ));

    let Some(justification) = payload.get("justification") else {
        reasons.push(
            "R003:MISSING_JUSTIFICATION: Required field 'justification' is missing from payload"
                .to_string(),
        );
        rule_trace.push(RuleTraceEntry::new(
            "R003",
            "check_justification_present",
            TraceStatus::Fail,
            "payload.justification not found",
        ));
        return PolicyVerdict {
            decision: Decision::Reject,
            reasons,
            rule_trace,
        };
    };
    rule_trace.push(RuleTraceEntry::new(
        "R003",
        "check_justification_present",
        TraceStatus::Pass,
        "payload.justification found",
    ));

    let justification_chars = match justification.as_str() {
        Some(text) if !text.trim().is_empty() => text.chars().count(),
        _ => {
            reasons.push(
                "R004:EMPTY_JUSTIFICATION: Field 'justification' must be a non-empty string"
                    .to_string(),
            );
            rule_trace.push(RuleTraceEntry::new(
                "R004",
                "check_justification_non_empty",
                TraceStatus::Fail,
                "justification is empty or not a string",
            ));
            return PolicyVerdict {
                decision: Decision::Reject,
                reasons,
                rule_trace,
            };
        }
    };
    rule_trace.push(RuleTraceEntry::new(
        "R004",
        "check_justification_non_empty",
        TraceStatus::Pass,
        format!("justification has {justification_chars} chars"),
    ));

    reasons.push(format!(
        "R005:DECISION_RECORDED: Decision '{}' recorded with justification",
        requested.as_str()
    ));
    rule_trace.push(RuleTraceEntry::new(
        "R005",
        "apply_decision",
        TraceStatus::Pass,
        format!("Recording decision={}", requested.as_str()),
    ));

    PolicyVerdict {
        decision: requested,
        reasons,
        rule_trace,
    }
}

// ============================================================================
// SECTION: Legacy Policy Rule
// ============================================================================

/// Evaluates the legacy assert rule kept for replay compatibility.
///
/// Rule: `payload.assert == true` accepts, anything else rejects.
fn evaluate_legacy_assert(payload: &Map<String, Value>) -> PolicyVerdict {
    if payload.get("assert") == Some(&Value::Bool(true)) {
        return PolicyVerdict {
            decision: Decision::Accept,
            reasons: vec!["Legacy MVP rule: payload.assert == true".to_string()],
            rule_trace: vec![RuleTraceEntry::new(
                "LEGACY",
                "mvp_assert_check",
                TraceStatus::Pass,
                "payload.assert == true",
            )],
        };
    }

    let (reason, detail) = match payload.get("assert") {
        None => (
            "Legacy MVP rule: payload.assert key not present".to_string(),
            "assert key missing".to_string(),
        ),
        Some(value) => {
            let shown = display_value(value);
            (
                format!("Legacy MVP rule: payload.assert == {shown} (not true)"),
                format!("assert = {shown}"),
            )
        }
    };

    PolicyVerdict {
        decision: Decision::Reject,
        reasons: vec![reason],
        rule_trace: vec![RuleTraceEntry::new(
            "LEGACY",
            "mvp_assert_check",
            TraceStatus::Fail,
            detail,
        )],
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders a payload value for trace details: strings bare, everything else
/// as its JSON text.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
