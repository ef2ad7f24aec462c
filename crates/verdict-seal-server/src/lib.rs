// verdict-seal-server/src/lib.rs
// ============================================================================
// Module: Verdict Seal Server Library
// Description: HTTP boundary adapter for the seal pipeline.
// Purpose: Translate wire requests and responses to and from core types.
// Dependencies: crate::{bootstrap, error, routes, state}, axum
// ============================================================================

//! ## Overview
//! The server is a thin boundary adapter: it parses wire bytes, delegates to
//! the core (schema, engine, store, replay), and maps core error kinds to
//! status codes. No decision logic lives here — a correct core can be
//! wrapped by any transport.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bootstrap;
pub mod error;
pub mod routes;
pub mod state;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bootstrap::ServerError;
pub use bootstrap::serve;
pub use error::ApiError;
pub use routes::app;
pub use state::AppState;
