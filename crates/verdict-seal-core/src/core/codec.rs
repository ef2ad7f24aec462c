// verdict-seal-core/src/core/codec.rs
// ============================================================================
// Module: Verdict Seal Canonical Codec
// Description: RFC 8785 JSON canonicalization and SHA-256 content hashing.
// Purpose: Provide the single source of truth for the bytes of a value.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Every digest in Verdict Seal is computed over canonical JSON bytes produced
//! by RFC 8785 (JCS): keys sorted at every nesting level, separators exactly
//! `,` and `:`, non-ASCII preserved literally, numbers in ECMA-262 shortest
//! round-trip form. NaN and Infinity are unrepresentable. Two structurally
//! equal values always canonicalize to identical bytes, on every platform.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length in hex characters of a SHA-256 digest.
pub const SHA256_HEX_LEN: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing canonical bytes.
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Canonicalization
// ============================================================================

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`CodecError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_jcs::to_vec(value).map_err(|err| CodecError::Canonicalization(err.to_string()))
}

/// Hashes the canonical JSON form of a value.
///
/// # Errors
///
/// Returns [`CodecError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(sha256_hex(&bytes))
}

// ============================================================================
// SECTION: Hashing
// ============================================================================

/// Computes the lowercase-hex SHA-256 digest of raw bytes.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

/// Returns true when the value is a 64-char lowercase hex SHA-256 digest.
#[must_use]
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == SHA256_HEX_LEN
        && value.bytes().all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte))
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
