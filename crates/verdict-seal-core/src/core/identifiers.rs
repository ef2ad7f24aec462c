// verdict-seal-core/src/core/identifiers.rs
// ============================================================================
// Module: Verdict Seal Identifiers
// Description: Canonical opaque identifiers for evaluations and policies.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque strings with `serde(transparent)` wire forms. The
//! evaluation identifier is content-derived: the first sixteen hex characters
//! of the canonical input digest. Derivation lives here so every component
//! shares one definition.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of input-digest hex characters used for an evaluation identifier.
pub const EVALUATION_ID_LEN: usize = 16;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Content-derived evaluation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationId(String);

impl EvaluationId {
    /// Creates an evaluation identifier from an existing string form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives the evaluation identifier from a canonical input digest.
    #[must_use]
    pub fn from_input_digest(input_sha256: &str) -> Self {
        Self(input_sha256.chars().take(EVALUATION_ID_LEN).collect())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for EvaluationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EvaluationId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Policy identifier addressing an entry in the policy registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(String);

impl PolicyId {
    /// Creates a new policy identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PolicyId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PolicyId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
