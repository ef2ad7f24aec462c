// verdict-seal-config/tests/config.rs
// ============================================================================
// Module: Configuration Tests
// Description: Tests for TOML loading, defaults, and validation.
// Purpose: Pin the config model and its fail-closed behavior.
// Dependencies: verdict-seal-config, tempfile
// ============================================================================
//! ## Overview
//! Validates defaults, explicit file loading, and the rejection of unknown
//! keys, bad hosts, and unregistered policy ids.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;
use std::path::PathBuf;

use verdict_seal_config::ConfigError;
use verdict_seal_config::SealConfig;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// The built-in defaults validate and match the documented values.
#[test]
fn defaults_are_valid() {
    let config = SealConfig::default();
    config.validate().unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 5000);
    assert_eq!(config.artifacts.root, PathBuf::from("artifacts"));
    assert_eq!(config.policy.default_policy_id.as_str(), "evaluation-policy-v1");
}

// ============================================================================
// SECTION: File Loading
// ============================================================================

/// An explicit TOML file overrides the defaults per section.
#[test]
fn explicit_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("verdict-seal.toml");
    fs::write(
        &path,
        r#"
[server]
host = "127.0.0.1"
port = 8088

[artifacts]
root = "/tmp/seal-artifacts"
"#,
    )
    .unwrap();

    let config = SealConfig::load(Some(&path)).unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8088);
    assert_eq!(config.artifacts.root, PathBuf::from("/tmp/seal-artifacts"));
    assert_eq!(config.policy.default_policy_id.as_str(), "evaluation-policy-v1");
}

/// A missing explicit file is an I/O error, not a silent default.
#[test]
fn missing_explicit_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = SealConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

/// Unknown keys are rejected.
#[test]
fn unknown_keys_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("verdict-seal.toml");
    fs::write(&path, "[server]\nhots = \"0.0.0.0\"\n").unwrap();

    let err = SealConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// A port of zero fails validation.
#[test]
fn zero_port_is_invalid() {
    let mut config = SealConfig::default();
    config.server.port = 0;
    assert!(matches!(config.validate().unwrap_err(), ConfigError::Invalid(_)));
}

/// A non-address host fails validation.
#[test]
fn bad_host_is_invalid() {
    let mut config = SealConfig::default();
    config.server.host = "not a host".to_string();
    assert!(matches!(config.validate().unwrap_err(), ConfigError::Invalid(_)));
}

/// An unregistered default policy id fails closed at load time.
#[test]
fn unknown_policy_id_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("verdict-seal.toml");
    fs::write(&path, "[policy]\ndefault_policy_id = \"no-such-policy\"\n").unwrap();

    let err = SealConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

/// The legacy policy id remains loadable for replaying old decisions.
#[test]
fn legacy_policy_id_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("verdict-seal.toml");
    fs::write(&path, "[policy]\ndefault_policy_id = \"mvp-placeholder-v0\"\n").unwrap();

    let config = SealConfig::load(Some(&path)).unwrap();
    assert_eq!(config.policy.default_policy_id.as_str(), "mvp-placeholder-v0");
}
