// verdict-seal-core/src/core/mod.rs
// ============================================================================
// Module: Verdict Seal Core Types
// Description: Canonical codec, schema, policy, and invariant layers.
// Purpose: Provide the pure building blocks of the seal pipeline.
// Dependencies: serde, serde_jcs, serde_json, sha2
// ============================================================================

//! ## Overview
//! Core modules define the canonical byte codec, the request/result data
//! model, strict schema validation, the enumerated policy registry, and the
//! invariant predicates. Everything here is pure: no clock, no randomness,
//! no I/O.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod codec;
pub mod evaluation;
pub mod identifiers;
pub mod invariants;
pub mod policy;
pub mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use codec::CodecError;
pub use codec::SHA256_HEX_LEN;
pub use codec::canonical_json_bytes;
pub use codec::hash_canonical_json;
pub use codec::is_sha256_hex;
pub use codec::sha256_hex;
pub use evaluation::Decision;
pub use evaluation::EvaluationMetadata;
pub use evaluation::EvaluationRequest;
pub use evaluation::EvaluationResult;
pub use evaluation::Manifest;
pub use evaluation::ManifestFileEntry;
pub use evaluation::ReplayVerdict;
pub use evaluation::TraceStatus;
pub use evaluation::TraceStep;
pub use identifiers::EVALUATION_ID_LEN;
pub use identifiers::EvaluationId;
pub use identifiers::PolicyId;
pub use invariants::InvariantCheck;
pub use invariants::InvariantScope;
pub use invariants::InvariantViolation;
pub use invariants::check_during_invariants;
pub use invariants::check_post_invariants;
pub use invariants::check_pre_invariants;
pub use policy::DEFAULT_POLICY_ID;
pub use policy::LEGACY_POLICY_ID;
pub use policy::Policy;
pub use policy::PolicyError;
pub use policy::PolicyVerdict;
pub use policy::RuleTraceEntry;
pub use schema::FieldError;
pub use schema::MAX_LABEL_LEN;
pub use schema::REQUEST_VERSION;
pub use schema::SchemaError;
pub use schema::SchemaErrorKind;
pub use schema::is_utc_timestamp_shaped;
pub use schema::parse_request;
