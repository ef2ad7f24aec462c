// verdict-seal-server/src/state.rs
// ============================================================================
// Module: Server State
// Description: Shared application state for HTTP handlers.
// Purpose: Carry the artifact store and default policy across requests.
// Dependencies: verdict-seal-core
// ============================================================================

//! ## Overview
//! Handler state is a cheaply clonable handle around the artifact store and
//! the configured default policy id. The store path is the only mutable
//! resource; it is owned by the store, never global.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use verdict_seal_core::ArtifactStore;
use verdict_seal_core::PolicyId;

// ============================================================================
// SECTION: Application State
// ============================================================================

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Append-only artifact store.
    pub store: Arc<ArtifactStore>,
    /// Policy id applied to fresh evaluations.
    pub default_policy_id: PolicyId,
}

impl AppState {
    /// Creates handler state around an opened store.
    #[must_use]
    pub fn new(store: ArtifactStore, default_policy_id: PolicyId) -> Self {
        Self {
            store: Arc::new(store),
            default_policy_id,
        }
    }
}
