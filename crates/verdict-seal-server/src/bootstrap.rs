// verdict-seal-server/src/bootstrap.rs
// ============================================================================
// Module: Server Bootstrap
// Description: Store initialization and HTTP serving.
// Purpose: Wire configuration into a running boundary adapter.
// Dependencies: axum, tokio, verdict-seal-config, verdict-seal-core
// ============================================================================

//! ## Overview
//! Bootstrap opens the artifact store (creating `evaluations/` and
//! `manifests/` under the configured root and verifying writability), then
//! serves the router until the task is cancelled. The core never reads the
//! clock; server log timestamps are emitted in UTC by the tracing
//! subscriber installed by the binary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tokio::net::TcpListener;
use verdict_seal_config::SealConfig;
use verdict_seal_core::ArtifactStore;
use verdict_seal_core::StoreError;

use crate::routes::app;
use crate::state::AppState;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server bootstrap and serving errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The artifact store could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Binding or serving the listener failed.
    #[error("server io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Serve
// ============================================================================

/// Opens the artifact store and serves the HTTP surface until shutdown.
///
/// # Errors
///
/// Returns [`ServerError`] when the store cannot be opened or the listener
/// fails.
pub async fn serve(config: &SealConfig) -> Result<(), ServerError> {
    let store = ArtifactStore::open(config.artifacts.root.clone())?;
    let state = AppState::new(store, config.policy.default_policy_id.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener =
        TcpListener::bind(&addr).await.map_err(|err| ServerError::Io(err.to_string()))?;
    tracing::info!(
        addr = %addr,
        artifact_root = %config.artifacts.root.display(),
        default_policy = %config.policy.default_policy_id,
        "verdict-seal listening"
    );

    axum::serve(listener, app(state)).await.map_err(|err| ServerError::Io(err.to_string()))
}
