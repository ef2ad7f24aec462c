// verdict-seal-server/src/routes.rs
// ============================================================================
// Module: Server Routes
// Description: HTTP handlers for evaluation, fetch, bundle, and replay.
// Purpose: Expose the seal pipeline over a JSON wire surface.
// Dependencies: axum, serde_json, verdict-seal-core
// ============================================================================

//! ## Overview
//! Handlers translate between wire bytes and core types. Fetch endpoints
//! return the exact persisted bytes so external verifiers can recompute
//! digests without re-serialization drift. All evaluation logic lives in the
//! core; these functions only parse, delegate, and map errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use verdict_seal_core::EvaluationArtifact;
use verdict_seal_core::parse_request;
use verdict_seal_core::replay_evaluation;
use verdict_seal_core::run_evaluation;

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the HTTP application router.
#[must_use]
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/evaluate", post(evaluate))
        .route("/evaluations/{evaluation_id}/input", get(get_input))
        .route("/evaluations/{evaluation_id}/output", get(get_output))
        .route("/evaluations/{evaluation_id}/trace", get(get_trace))
        .route("/evaluations/{evaluation_id}/meta", get(get_metadata))
        .route("/evaluations/{evaluation_id}/manifest", get(get_manifest))
        .route("/evaluations/{evaluation_id}/bundle", get(get_bundle))
        .route("/replay/{evaluation_id}", post(replay))
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/schema", get(schema))
        .with_state(state)
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Processes an evaluation request: validate, evaluate, seal, respond.
async fn evaluate(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let value: Value = serde_json::from_slice(&body)
        .map_err(|err| ApiError::MalformedJson(err.to_string()))?;
    let request = parse_request(&value)?;

    let (result, _input_sha256) = run_evaluation(&request, Some(&state.default_policy_id))?;
    let stored = state.store.store(&request, &result)?;

    tracing::info!(
        evaluation_id = %stored.evaluation_id,
        decision = stored.decision.as_str(),
        "evaluation sealed"
    );

    Ok(Json(json!({
        "evaluation_id": stored.evaluation_id.as_str(),
        "result": stored,
    }))
    .into_response())
}

// ============================================================================
// SECTION: Artifact Fetch
// ============================================================================

/// Returns the exact persisted input.json bytes.
async fn get_input(
    State(state): State<AppState>,
    Path(evaluation_id): Path<String>,
) -> Result<Response, ApiError> {
    artifact_response(&state, &evaluation_id, EvaluationArtifact::Input)
}

/// Returns the exact persisted output.json bytes.
async fn get_output(
    State(state): State<AppState>,
    Path(evaluation_id): Path<String>,
) -> Result<Response, ApiError> {
    artifact_response(&state, &evaluation_id, EvaluationArtifact::Output)
}

/// Returns the exact persisted trace.json bytes.
async fn get_trace(
    State(state): State<AppState>,
    Path(evaluation_id): Path<String>,
) -> Result<Response, ApiError> {
    artifact_response(&state, &evaluation_id, EvaluationArtifact::Trace)
}

/// Returns the exact persisted metadata.json bytes.
async fn get_metadata(
    State(state): State<AppState>,
    Path(evaluation_id): Path<String>,
) -> Result<Response, ApiError> {
    artifact_response(&state, &evaluation_id, EvaluationArtifact::Metadata)
}

/// Returns the exact persisted manifest bytes.
async fn get_manifest(
    State(state): State<AppState>,
    Path(evaluation_id): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state
        .store
        .read_manifest(&evaluation_id)?
        .ok_or_else(|| ApiError::NotFound(evaluation_id.clone()))?;
    Ok(json_bytes_response(bytes))
}

/// Returns the deterministic ZIP bundle as an attachment.
async fn get_bundle(
    State(state): State<AppState>,
    Path(evaluation_id): Path<String>,
) -> Result<Response, ApiError> {
    let bundle = state
        .store
        .bundle(&evaluation_id)?
        .ok_or_else(|| ApiError::NotFound(evaluation_id.clone()))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/zip"));
    let disposition = format!("attachment; filename={evaluation_id}.zip");
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok((StatusCode::OK, headers, bundle).into_response())
}

/// Looks up one evaluation artifact, mapping absence to 404.
fn artifact_response(
    state: &AppState,
    evaluation_id: &str,
    artifact: EvaluationArtifact,
) -> Result<Response, ApiError> {
    let bytes = state
        .store
        .read_artifact(evaluation_id, artifact)?
        .ok_or_else(|| ApiError::NotFound(evaluation_id.to_string()))?;
    Ok(json_bytes_response(bytes))
}

/// Wraps persisted JSON bytes in a response without re-serialization.
fn json_bytes_response(bytes: Vec<u8>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    (StatusCode::OK, headers, bytes).into_response()
}

// ============================================================================
// SECTION: Replay
// ============================================================================

/// Replays a sealed evaluation; the verdict is the payload.
async fn replay(
    State(state): State<AppState>,
    Path(evaluation_id): Path<String>,
) -> Result<Response, ApiError> {
    let verdict = replay_evaluation(&state.store, &evaluation_id)?;
    if !verdict.replay_ok {
        tracing::warn!(evaluation_id = %evaluation_id, "replay mismatch reported");
    }
    Ok(Json(verdict).into_response())
}

// ============================================================================
// SECTION: Service Endpoints
// ============================================================================

/// Health probe.
async fn health() -> Response {
    Json(json!({"status": "ok", "strict_mode": true})).into_response()
}

/// Build identity of the running service.
async fn version() -> Response {
    Json(json!({
        "name": "verdict-seal",
        "version": env!("CARGO_PKG_VERSION"),
        "commit": option_env!("VERDICT_SEAL_COMMIT").unwrap_or("unknown"),
    }))
    .into_response()
}

/// Human-readable description of the wire schema.
async fn schema() -> Response {
    Json(json!({
        "request": {
            "required": ["version", "subject", "ruleset", "payload", "injected_time_utc"],
            "properties": {
                "version": "literal 'v1'",
                "subject": "string, 1..=128 chars",
                "ruleset": "string, 1..=128 chars",
                "payload": "JSON object; string keys, finite numbers only",
                "injected_time_utc": "YYYY-MM-DDTHH:MM:SS(.f)?(Z|±HH:MM)",
            },
        },
        "response": {
            "evaluation_id": "first 16 hex chars of the canonical input sha256",
            "result": "sealed evaluation result with digests, reasons, and trace",
        },
        "mvp_rule": "Default policy records payload.decision_requested when a \
                     non-empty justification is present; legacy policy accepts \
                     only payload.assert == true",
    }))
    .into_response()
}
