// verdict-seal-core/src/runtime/store.rs
// ============================================================================
// Module: Verdict Seal Artifact Store
// Description: Append-only filesystem persistence for sealed evaluations.
// Purpose: Commit evaluation artifacts atomically and serve them verbatim.
// Dependencies: crate::core, serde_json, tempfile
// ============================================================================

//! ## Overview
//! The artifact store owns a single explicit root directory and enforces the
//! append-only discipline: an evaluation directory, once committed, is never
//! rewritten or deleted. Files are written with temp + fsync + rename; the
//! whole evaluation commits with one directory rename, so concurrent
//! duplicates serialize on the filesystem and the loser observes
//! [`StoreError::AlreadyExists`]. Loads signal absence with `None` rather
//! than an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::codec::CodecError;
use crate::core::codec::canonical_json_bytes;
use crate::core::codec::hash_canonical_json;
use crate::core::codec::sha256_hex;
use crate::core::evaluation::Decision;
use crate::core::evaluation::EvaluationMetadata;
use crate::core::evaluation::EvaluationRequest;
use crate::core::evaluation::EvaluationResult;
use crate::core::evaluation::Manifest;
use crate::core::evaluation::ManifestFileEntry;
use crate::core::identifiers::EvaluationId;
use crate::core::identifiers::PolicyId;
use crate::runtime::bundle::build_bundle;

// ============================================================================
// SECTION: Layout Constants
// ============================================================================

/// Subdirectory holding one directory per sealed evaluation.
pub const EVALUATIONS_DIR: &str = "evaluations";
/// Subdirectory holding one manifest file per sealed evaluation.
pub const MANIFESTS_DIR: &str = "manifests";
/// Canonical request bytes.
pub const INPUT_FILE: &str = "input.json";
/// Output projection bytes.
pub const OUTPUT_FILE: &str = "output.json";
/// Trace step array bytes.
pub const TRACE_FILE: &str = "trace.json";
/// Denormalized metadata record bytes.
pub const METADATA_FILE: &str = "metadata.json";
/// Suffix of per-evaluation manifest files under [`MANIFESTS_DIR`].
pub const MANIFEST_SUFFIX: &str = ".manifest.json";
/// Prefix of transient staging directories; never collides with an id.
const STAGING_PREFIX: &str = ".staging-";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Artifact store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The evaluation directory is already committed (append-only).
    #[error("evaluation already exists (append-only): {0}")]
    AlreadyExists(EvaluationId),
    /// The artifact root is missing or not writable.
    #[error("artifact root not writable: {0}")]
    NotWritable(String),
    /// Filesystem operation failed.
    #[error("artifact store io error: {0}")]
    Io(String),
    /// Canonical serialization or artifact parsing failed.
    #[error("artifact serialization error: {0}")]
    Serialization(String),
}

impl From<CodecError> for StoreError {
    fn from(err: CodecError) -> Self {
        Self::Serialization(err.to_string())
    }
}

// ============================================================================
// SECTION: Output Projection
// ============================================================================

/// The persisted shape of `output.json`.
///
/// The projection deliberately omits the trace (persisted separately) and
/// the manifest digest (not yet computed when the output is sealed).
#[derive(Serialize)]
struct OutputRecord<'a> {
    /// Evaluation identifier.
    evaluation_id: &'a EvaluationId,
    /// Canonical input digest.
    input_sha256: &'a str,
    /// Canonical output digest.
    output_sha256: &'a str,
    /// Policy that produced the verdict; replay re-runs this exact policy.
    policy_id: &'a PolicyId,
    /// Final decision.
    decision: Decision,
    /// Decision reasons.
    reasons: &'a [String],
    /// Caller-injected timestamp.
    created_time_utc: &'a str,
}

// ============================================================================
// SECTION: Artifact Files
// ============================================================================

/// Files persisted inside an evaluation directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationArtifact {
    /// Canonical request bytes.
    Input,
    /// Output projection.
    Output,
    /// Trace step array.
    Trace,
    /// Denormalized metadata record.
    Metadata,
}

impl EvaluationArtifact {
    /// Returns the on-disk file name of the artifact.
    #[must_use]
    pub const fn file_name(&self) -> &'static str {
        match self {
            Self::Input => INPUT_FILE,
            Self::Output => OUTPUT_FILE,
            Self::Trace => TRACE_FILE,
            Self::Metadata => METADATA_FILE,
        }
    }
}

// ============================================================================
// SECTION: Artifact Store
// ============================================================================

/// Append-only filesystem store rooted at an explicit directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// Artifact root; the only path the store ever writes under.
    root: PathBuf,
}

impl ArtifactStore {
    /// Opens the store, creating the layout directories when absent and
    /// verifying the root is writable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the layout cannot be created or the root
    /// is not writable.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(EVALUATIONS_DIR))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        fs::create_dir_all(root.join(MANIFESTS_DIR))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let store = Self {
            root,
        };
        store.verify_writable()?;
        Ok(store)
    }

    /// Returns the artifact root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns true when an evaluation directory is committed for the id.
    #[must_use]
    pub fn exists(&self, evaluation_id: &str) -> bool {
        self.evaluation_dir(evaluation_id).is_dir()
    }

    /// Stores a sealed evaluation.
    ///
    /// Writes input, trace, output, and metadata into a staging directory,
    /// persists the manifest, then commits with a single directory rename.
    /// Returns the result with `manifest_sha256` filled.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] when the id is committed,
    /// [`StoreError::NotWritable`] when the root check fails, or
    /// [`StoreError::Io`]/[`StoreError::Serialization`] on write failures.
    /// A failed store never leaves a committed directory behind.
    pub fn store(
        &self,
        request: &EvaluationRequest,
        result: &EvaluationResult,
    ) -> Result<EvaluationResult, StoreError> {
        self.verify_writable()?;

        let evaluation_dir = self.evaluation_dir(result.evaluation_id.as_str());
        if evaluation_dir.exists() {
            return Err(StoreError::AlreadyExists(result.evaluation_id.clone()));
        }

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(self.root.join(EVALUATIONS_DIR))
            .map_err(|err| StoreError::Io(err.to_string()))?;

        let (input_sha256, input_size) =
            write_json_artifact(&staging.path().join(INPUT_FILE), request)?;
        let (trace_sha256, trace_size) =
            write_json_artifact(&staging.path().join(TRACE_FILE), &result.trace)?;
        let (output_sha256, output_size) = write_json_artifact(
            &staging.path().join(OUTPUT_FILE),
            &OutputRecord {
                evaluation_id: &result.evaluation_id,
                input_sha256: &result.input_sha256,
                output_sha256: &result.output_sha256,
                policy_id: &result.policy_id,
                decision: result.decision,
                reasons: &result.reasons,
                created_time_utc: &result.created_time_utc,
            },
        )?;

        let mut manifest = Manifest {
            evaluation_id: result.evaluation_id.clone(),
            files: vec![
                ManifestFileEntry {
                    path: INPUT_FILE.to_string(),
                    sha256: input_sha256,
                    size: input_size,
                },
                ManifestFileEntry {
                    path: OUTPUT_FILE.to_string(),
                    sha256: output_sha256,
                    size: output_size,
                },
                ManifestFileEntry {
                    path: TRACE_FILE.to_string(),
                    sha256: trace_sha256.clone(),
                    size: trace_size,
                },
            ],
            manifest_sha256: None,
        };
        let manifest_sha256 = hash_canonical_json(&manifest)?;

        let metadata = EvaluationMetadata {
            evaluation_id: result.evaluation_id.clone(),
            injected_time_utc: request.injected_time_utc.clone(),
            subject: request.subject.clone(),
            ruleset: request.ruleset.clone(),
            input_sha256: result.input_sha256.clone(),
            output_sha256: result.output_sha256.clone(),
            trace_sha256,
            manifest_sha256: manifest_sha256.clone(),
        };
        write_json_artifact(&staging.path().join(METADATA_FILE), &metadata)?;

        manifest.manifest_sha256 = Some(manifest_sha256.clone());
        write_json_artifact(&self.manifest_path(result.evaluation_id.as_str()), &manifest)?;

        match fs::rename(staging.path(), &evaluation_dir) {
            Ok(()) => {
                // The staged path has moved; suppress the TempDir cleanup.
                let _ = staging.keep();
            }
            Err(err) => {
                return if evaluation_dir.is_dir() {
                    Err(StoreError::AlreadyExists(result.evaluation_id.clone()))
                } else {
                    Err(StoreError::Io(err.to_string()))
                };
            }
        }

        let mut stored = result.clone();
        stored.manifest_sha256 = manifest_sha256;
        Ok(stored)
    }

    /// Reads the exact persisted bytes of an evaluation artifact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on read failures other than absence.
    pub fn read_artifact(
        &self,
        evaluation_id: &str,
        artifact: EvaluationArtifact,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        read_optional(&self.evaluation_dir(evaluation_id).join(artifact.file_name()))
    }

    /// Reads the exact persisted bytes of an evaluation manifest.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on read failures other than absence.
    pub fn read_manifest(&self, evaluation_id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        read_optional(&self.manifest_path(evaluation_id))
    }

    /// Loads and parses `input.json` for an evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on I/O or parse failures; absence is `None`.
    pub fn load_input(&self, evaluation_id: &str) -> Result<Option<Value>, StoreError> {
        self.load_artifact(evaluation_id, EvaluationArtifact::Input)
    }

    /// Loads and parses `output.json` for an evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on I/O or parse failures; absence is `None`.
    pub fn load_output(&self, evaluation_id: &str) -> Result<Option<Value>, StoreError> {
        self.load_artifact(evaluation_id, EvaluationArtifact::Output)
    }

    /// Loads and parses `trace.json` for an evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on I/O or parse failures; absence is `None`.
    pub fn load_trace(&self, evaluation_id: &str) -> Result<Option<Value>, StoreError> {
        self.load_artifact(evaluation_id, EvaluationArtifact::Trace)
    }

    /// Loads and parses `metadata.json` for an evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on I/O or parse failures; absence is `None`.
    pub fn load_metadata(&self, evaluation_id: &str) -> Result<Option<Value>, StoreError> {
        self.load_artifact(evaluation_id, EvaluationArtifact::Metadata)
    }

    /// Loads and parses the manifest for an evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on I/O or parse failures; absence is `None`.
    pub fn load_manifest(&self, evaluation_id: &str) -> Result<Option<Value>, StoreError> {
        match self.read_manifest(evaluation_id)? {
            None => Ok(None),
            Some(bytes) => parse_json(&bytes).map(Some),
        }
    }

    /// Builds the deterministic ZIP bundle for a committed evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on I/O or bundling failures; absence is `None`.
    pub fn bundle(&self, evaluation_id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let evaluation_dir = self.evaluation_dir(evaluation_id);
        if !evaluation_dir.is_dir() {
            return Ok(None);
        }
        build_bundle(&evaluation_dir, &self.manifest_path(evaluation_id), evaluation_id).map(Some)
    }

    /// Loads and parses one evaluation artifact.
    fn load_artifact(
        &self,
        evaluation_id: &str,
        artifact: EvaluationArtifact,
    ) -> Result<Option<Value>, StoreError> {
        match self.read_artifact(evaluation_id, artifact)? {
            None => Ok(None),
            Some(bytes) => parse_json(&bytes).map(Some),
        }
    }

    /// Returns the committed directory path for an evaluation id.
    fn evaluation_dir(&self, evaluation_id: &str) -> PathBuf {
        self.root.join(EVALUATIONS_DIR).join(evaluation_id)
    }

    /// Returns the manifest file path for an evaluation id.
    fn manifest_path(&self, evaluation_id: &str) -> PathBuf {
        self.root.join(MANIFESTS_DIR).join(format!("{evaluation_id}{MANIFEST_SUFFIX}"))
    }

    /// Verifies the artifact root exists and accepts writes.
    fn verify_writable(&self) -> Result<(), StoreError> {
        if !self.root.is_dir() {
            return Err(StoreError::NotWritable(format!(
                "artifact root does not exist: {}",
                self.root.display()
            )));
        }
        tempfile::NamedTempFile::new_in(&self.root)
            .map(drop)
            .map_err(|err| StoreError::NotWritable(err.to_string()))
    }
}

// ============================================================================
// SECTION: Atomic Writes
// ============================================================================

/// Serializes a value to canonical bytes and writes it atomically.
///
/// Returns the digest and byte size of the persisted content.
fn write_json_artifact<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(String, u64), StoreError> {
    let bytes = canonical_json_bytes(value)?;
    let sha256 = sha256_hex(&bytes);
    let size = u64::try_from(bytes.len())
        .map_err(|_| StoreError::Serialization("artifact size exceeds u64".to_string()))?;
    atomic_write(path, &bytes)?;
    Ok((sha256, size))
}

/// Writes bytes atomically: temp file in the destination directory, full
/// write, fsync, close, rename over the target.
///
/// The temp file is removed on every failure path before the error
/// propagates.
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::Io(format!("no parent directory for {}", path.display())))?;
    let mut temp =
        tempfile::NamedTempFile::new_in(dir).map_err(|err| StoreError::Io(err.to_string()))?;
    temp.write_all(bytes).map_err(|err| StoreError::Io(err.to_string()))?;
    temp.as_file().sync_all().map_err(|err| StoreError::Io(err.to_string()))?;
    temp.persist(path).map_err(|err| StoreError::Io(err.to_string()))?;
    Ok(())
}

// ============================================================================
// SECTION: Reads
// ============================================================================

/// Reads a file's bytes, mapping absence to `None`.
fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(StoreError::Io(err.to_string())),
    }
}

/// Parses persisted JSON bytes.
fn parse_json(bytes: &[u8]) -> Result<Value, StoreError> {
    serde_json::from_slice(bytes).map_err(|err| StoreError::Serialization(err.to_string()))
}
