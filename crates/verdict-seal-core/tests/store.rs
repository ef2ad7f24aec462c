// verdict-seal-core/tests/store.rs
// ============================================================================
// Module: Artifact Store Tests
// Description: Tests for append-only persistence and the manifest digest.
// Purpose: Pin the on-disk layout, atomicity, and bundle determinism.
// Dependencies: verdict-seal-core, serde_json, tempfile
// ============================================================================
//! ## Overview
//! Validates the five-file layout, the AlreadyExists append-only discipline,
//! the manifest digest excluding its embedded copy, absence-as-None loads,
//! and byte-identical bundles.

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

use serde_json::Value;
use serde_json::json;
use verdict_seal_core::ArtifactStore;
use verdict_seal_core::EvaluationArtifact;
use verdict_seal_core::EvaluationRequest;
use verdict_seal_core::EvaluationResult;
use verdict_seal_core::StoreError;
use verdict_seal_core::canonical_json_bytes;
use verdict_seal_core::run_evaluation;
use verdict_seal_core::sha256_hex;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds and evaluates a request, returning it with its unsealed result.
fn evaluated(payload: Value) -> (EvaluationRequest, EvaluationResult) {
    let request = EvaluationRequest {
        version: "v1".to_string(),
        subject: "s".to_string(),
        ruleset: "r".to_string(),
        payload: payload.as_object().unwrap().clone(),
        injected_time_utc: "2024-01-01T00:00:00Z".to_string(),
    };
    let (result, _) = run_evaluation(&request, None).unwrap();
    (request, result)
}

/// A default ACCEPT request/result pair.
fn accept_pair() -> (EvaluationRequest, EvaluationResult) {
    evaluated(json!({"decision_requested": "ACCEPT", "justification": "ok"}))
}

// ============================================================================
// SECTION: Layout
// ============================================================================

/// Opening the store creates the layout directories.
#[test]
fn open_creates_layout() {
    let root = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(root.path().join("artifacts")).unwrap();
    assert!(store.root().join("evaluations").is_dir());
    assert!(store.root().join("manifests").is_dir());
}

/// A committed evaluation has all five files in their documented places.
#[test]
fn store_commits_five_files() {
    let root = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(root.path()).unwrap();
    let (request, result) = accept_pair();

    let stored = store.store(&request, &result).unwrap();
    let id = stored.evaluation_id.as_str();

    let evaluation_dir = root.path().join("evaluations").join(id);
    for file in ["input.json", "output.json", "trace.json", "metadata.json"] {
        assert!(evaluation_dir.join(file).is_file(), "missing {file}");
    }
    assert!(
        root.path().join("manifests").join(format!("{id}.manifest.json")).is_file(),
        "missing manifest"
    );
    assert!(store.exists(id));
}

/// input.json holds exactly the canonical request bytes.
#[test]
fn input_file_holds_canonical_bytes() {
    let root = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(root.path()).unwrap();
    let (request, result) = accept_pair();

    let stored = store.store(&request, &result).unwrap();
    let bytes = store
        .read_artifact(stored.evaluation_id.as_str(), EvaluationArtifact::Input)
        .unwrap()
        .unwrap();
    assert_eq!(bytes, canonical_json_bytes(&request).unwrap());
    assert_eq!(sha256_hex(&bytes), stored.input_sha256);
}

/// output.json carries the projection fields including the policy id.
#[test]
fn output_projection_has_expected_fields() {
    let root = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(root.path()).unwrap();
    let (request, result) = accept_pair();

    let stored = store.store(&request, &result).unwrap();
    let output = store.load_output(stored.evaluation_id.as_str()).unwrap().unwrap();

    let keys: Vec<&str> = output.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "created_time_utc",
            "decision",
            "evaluation_id",
            "input_sha256",
            "output_sha256",
            "policy_id",
            "reasons",
        ]
    );
    assert_eq!(output["decision"], json!("ACCEPT"));
    assert_eq!(output["policy_id"], json!("evaluation-policy-v1"));
}

// ============================================================================
// SECTION: Append-Only Discipline
// ============================================================================

/// Storing the same request twice yields AlreadyExists.
#[test]
fn duplicate_store_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(root.path()).unwrap();
    let (request, result) = accept_pair();

    store.store(&request, &result).unwrap();
    let err = store.store(&request, &result).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));
}

/// A rejected duplicate leaves the committed bytes untouched.
#[test]
fn duplicate_store_does_not_mutate_committed_files() {
    let root = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(root.path()).unwrap();
    let (request, result) = accept_pair();

    let stored = store.store(&request, &result).unwrap();
    let id = stored.evaluation_id.as_str();
    let before = store.read_artifact(id, EvaluationArtifact::Output).unwrap().unwrap();

    let _ = store.store(&request, &result).unwrap_err();
    let after = store.read_artifact(id, EvaluationArtifact::Output).unwrap().unwrap();
    assert_eq!(before, after);
}

/// No staging residue survives a committed store.
#[test]
fn no_staging_directories_remain() {
    let root = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(root.path()).unwrap();
    let (request, result) = accept_pair();
    store.store(&request, &result).unwrap();

    let leftovers: Vec<String> = std::fs::read_dir(root.path().join("evaluations"))
        .unwrap()
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with('.'))
        .collect();
    assert!(leftovers.is_empty(), "staging residue: {leftovers:?}");
}

// ============================================================================
// SECTION: Manifest Digest
// ============================================================================

/// The manifest digest covers the canonical form without the embedded
/// `manifest_sha256` field.
#[test]
fn manifest_digest_excludes_embedded_field() {
    let root = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(root.path()).unwrap();
    let (request, result) = accept_pair();

    let stored = store.store(&request, &result).unwrap();
    let mut manifest = store.load_manifest(stored.evaluation_id.as_str()).unwrap().unwrap();

    let embedded =
        manifest["manifest_sha256"].as_str().unwrap().to_string();
    assert_eq!(embedded, stored.manifest_sha256);

    manifest.as_object_mut().unwrap().remove("manifest_sha256");
    let recomputed = sha256_hex(&canonical_json_bytes(&manifest).unwrap());
    assert_eq!(recomputed, embedded);
}

/// The manifest lists input, output, trace in fixed order with true sizes.
#[test]
fn manifest_lists_files_in_fixed_order() {
    let root = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(root.path()).unwrap();
    let (request, result) = accept_pair();

    let stored = store.store(&request, &result).unwrap();
    let id = stored.evaluation_id.as_str();
    let manifest = store.load_manifest(id).unwrap().unwrap();

    let files = manifest["files"].as_array().unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f["path"].as_str().unwrap()).collect();
    assert_eq!(paths, vec!["input.json", "output.json", "trace.json"]);

    for file in files {
        let bytes = store
            .read_artifact(
                id,
                match file["path"].as_str().unwrap() {
                    "input.json" => EvaluationArtifact::Input,
                    "output.json" => EvaluationArtifact::Output,
                    _ => EvaluationArtifact::Trace,
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(file["sha256"].as_str().unwrap(), sha256_hex(&bytes));
        assert_eq!(file["size"].as_u64().unwrap(), u64::try_from(bytes.len()).unwrap());
    }
}

/// metadata.json cross-references every digest.
#[test]
fn metadata_cross_references_digests() {
    let root = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(root.path()).unwrap();
    let (request, result) = accept_pair();

    let stored = store.store(&request, &result).unwrap();
    let metadata = store.load_metadata(stored.evaluation_id.as_str()).unwrap().unwrap();

    assert_eq!(metadata["evaluation_id"], json!(stored.evaluation_id.as_str()));
    assert_eq!(metadata["subject"], json!("s"));
    assert_eq!(metadata["ruleset"], json!("r"));
    assert_eq!(metadata["input_sha256"], json!(stored.input_sha256));
    assert_eq!(metadata["output_sha256"], json!(stored.output_sha256));
    assert_eq!(metadata["manifest_sha256"], json!(stored.manifest_sha256));
}

// ============================================================================
// SECTION: Loads
// ============================================================================

/// Loads signal absence with None, never an error.
#[test]
fn loads_return_none_for_unknown_id() {
    let root = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(root.path()).unwrap();

    assert!(store.load_input("0000000000000000").unwrap().is_none());
    assert!(store.load_output("0000000000000000").unwrap().is_none());
    assert!(store.load_trace("0000000000000000").unwrap().is_none());
    assert!(store.load_metadata("0000000000000000").unwrap().is_none());
    assert!(store.load_manifest("0000000000000000").unwrap().is_none());
    assert!(store.bundle("0000000000000000").unwrap().is_none());
    assert!(!store.exists("0000000000000000"));
}

// ============================================================================
// SECTION: Bundle
// ============================================================================

/// Two bundles of the same evaluation are byte-identical.
#[test]
fn bundle_is_byte_identical() {
    let root = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(root.path()).unwrap();
    let (request, result) = accept_pair();

    let stored = store.store(&request, &result).unwrap();
    let first = store.bundle(stored.evaluation_id.as_str()).unwrap().unwrap();
    let second = store.bundle(stored.evaluation_id.as_str()).unwrap().unwrap();
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

/// The bundle contains the five entries in ascending name order under the
/// evaluation id folder.
#[test]
fn bundle_entries_are_sorted_under_id_folder() {
    let root = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(root.path()).unwrap();
    let (request, result) = accept_pair();

    let stored = store.store(&request, &result).unwrap();
    let id = stored.evaluation_id.as_str();
    let bundle = store.bundle(id).unwrap().unwrap();

    // Local file headers appear in entry order; scan for the name fields.
    let expected = [
        format!("{id}/input.json"),
        format!("{id}/manifest.json"),
        format!("{id}/metadata.json"),
        format!("{id}/output.json"),
        format!("{id}/trace.json"),
    ];
    let haystack = bundle.as_slice();
    let mut last_position = 0;
    for name in &expected {
        let needle = name.as_bytes();
        let position = haystack[last_position..]
            .windows(needle.len())
            .position(|window| window == needle)
            .unwrap_or_else(|| panic!("bundle entry missing or out of order: {name}"));
        last_position += position;
    }
}
