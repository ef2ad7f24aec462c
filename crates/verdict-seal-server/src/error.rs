// verdict-seal-server/src/error.rs
// ============================================================================
// Module: Server Error Mapping
// Description: Maps core error kinds to HTTP status codes and envelopes.
// Purpose: Keep the error taxonomy of the core visible on the wire.
// Dependencies: axum, serde, verdict-seal-core
// ============================================================================

//! ## Overview
//! Every core component raises its own error kind; this module translates
//! kinds to outward categories: schema errors to 422 with a field list, pre
//! invariant violations to 400, post violations to 500, duplicate commits to
//! 409, storage faults to 500, and absent evaluations to 404. A replay
//! mismatch is never an error — the verdict is the payload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use verdict_seal_core::EngineError;
use verdict_seal_core::InvariantScope;
use verdict_seal_core::ReplayError;
use verdict_seal_core::SchemaError;
use verdict_seal_core::SchemaErrorKind;
use verdict_seal_core::StoreError;

// ============================================================================
// SECTION: API Error
// ============================================================================

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body is not valid JSON.
    #[error("invalid json: {0}")]
    MalformedJson(String),
    /// The request body does not satisfy the schema.
    #[error(transparent)]
    Validation(#[from] SchemaError),
    /// The engine aborted the evaluation.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// The store rejected or failed the commit.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Replay could not produce a verdict.
    #[error(transparent)]
    Replay(#[from] ReplayError),
    /// The requested evaluation does not exist.
    #[error("Evaluation not found: {0}")]
    NotFound(String),
}

// ============================================================================
// SECTION: Wire Envelopes
// ============================================================================

/// One entry in a 422 validation error detail list.
#[derive(Debug, Serialize)]
struct ValidationDetail {
    /// Dotted path of the offending field.
    field: String,
    /// Human-readable message.
    message: String,
    /// Error kind label.
    #[serde(rename = "type")]
    kind: &'static str,
    /// Suggested fix, when one is mechanical.
    #[serde(skip_serializing_if = "Option::is_none")]
    fix: Option<&'static str>,
}

/// Returns the mechanical fix suggestion for a schema error kind.
const fn fix_for(kind: SchemaErrorKind) -> Option<&'static str> {
    match kind {
        SchemaErrorKind::Missing => Some("Add the required field"),
        SchemaErrorKind::ExtraForbidden => Some("Remove the unexpected field"),
        SchemaErrorKind::WrongType => Some("Use the documented JSON type"),
        SchemaErrorKind::InvalidValue => None,
    }
}

// ============================================================================
// SECTION: Response Mapping
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::MalformedJson(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Invalid JSON", "message": message})),
            )
                .into_response(),
            Self::Validation(err) => {
                let details: Vec<ValidationDetail> = err
                    .errors
                    .iter()
                    .map(|field_error| ValidationDetail {
                        field: field_error.field.clone(),
                        message: field_error.message.clone(),
                        kind: field_error.kind.as_str(),
                        fix: fix_for(field_error.kind),
                    })
                    .collect();
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({
                        "error": "Validation failed",
                        "details": details,
                        "hint": "Request must match the v1 evaluation schema",
                    })),
                )
                    .into_response()
            }
            Self::Engine(err) => engine_response(&err),
            Self::Store(err) => store_response(&err),
            Self::Replay(err) => replay_response(&err),
            Self::NotFound(id) => not_found(&format!("Evaluation not found: {id}")),
        }
    }
}

/// Maps engine errors: pre violations are the caller's fault, everything
/// else indicates an implementation or registry fault.
fn engine_response(err: &EngineError) -> Response {
    match err {
        EngineError::Invariant(violation) if violation.scope == InvariantScope::Pre => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invariant violation", "message": violation.to_string()})),
        )
            .into_response(),
        EngineError::Policy(policy_err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "Unknown policy", "message": policy_err.to_string()})),
        )
            .into_response(),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Evaluation failed", "message": other.to_string()})),
        )
            .into_response(),
    }
}

/// Maps store errors: duplicates are a structured 409, the rest are 500s.
fn store_response(err: &StoreError) -> Response {
    match err {
        StoreError::AlreadyExists(evaluation_id) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "Duplicate evaluation",
                "message": format!(
                    "Evaluation {evaluation_id} is already sealed; artifacts are append-only"
                ),
                "evaluation_id": evaluation_id.as_str(),
                "fix": "Fetch the existing artifacts, or change the request content",
            })),
        )
            .into_response(),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Storage failed", "message": other.to_string()})),
        )
            .into_response(),
    }
}

/// Maps replay errors: absence is 404, store faults are 500s.
fn replay_response(err: &ReplayError) -> Response {
    match err {
        ReplayError::NotFound(_) | ReplayError::MissingArtifact { .. } => {
            not_found(&err.to_string())
        }
        ReplayError::Store(store_err) => store_response(store_err),
    }
}

/// Builds a 404 response with a simple error body.
fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": message}))).into_response()
}
