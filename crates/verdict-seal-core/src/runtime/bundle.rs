// verdict-seal-core/src/runtime/bundle.rs
// ============================================================================
// Module: Verdict Seal Deterministic Bundle
// Description: Byte-identical ZIP export of a sealed evaluation.
// Purpose: Package the five sealed files for offline verification.
// Dependencies: crate::runtime::store, zip
// ============================================================================

//! ## Overview
//! The bundle is a ZIP over the four evaluation files plus the manifest,
//! under a top-level `<evaluation_id>/` folder, in ascending entry-name
//! order. Every entry carries a fixed timestamp and a fixed compression
//! method and level, so two bundles of the same evaluation are
//! byte-identical.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Cursor;
use std::io::Write;
use std::path::Path;

use zip::CompressionMethod;
use zip::DateTime;
use zip::write::SimpleFileOptions;
use zip::write::ZipWriter;

use crate::runtime::store::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Entry name of the manifest inside the bundle.
const BUNDLE_MANIFEST_NAME: &str = "manifest.json";

/// Fixed compression level for every bundle entry.
const BUNDLE_COMPRESSION_LEVEL: i64 = 6;

// ============================================================================
// SECTION: Bundle Builder
// ============================================================================

/// Builds the deterministic ZIP bundle for one committed evaluation.
///
/// Entries are the files of `evaluation_dir` plus the manifest (renamed to
/// `manifest.json`), all under `<evaluation_id>/`, sorted by entry name.
///
/// # Errors
///
/// Returns [`StoreError`] when reading artifacts or writing the archive
/// fails.
pub fn build_bundle(
    evaluation_dir: &Path,
    manifest_path: &Path,
    evaluation_id: &str,
) -> Result<Vec<u8>, StoreError> {
    let mut entries = Vec::new();

    let listing = fs::read_dir(evaluation_dir).map_err(|err| StoreError::Io(err.to_string()))?;
    for item in listing {
        let item = item.map_err(|err| StoreError::Io(err.to_string()))?;
        let path = item.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let bytes = fs::read(&path).map_err(|err| StoreError::Io(err.to_string()))?;
        entries.push((format!("{evaluation_id}/{file_name}"), bytes));
    }

    if manifest_path.is_file() {
        let bytes = fs::read(manifest_path).map_err(|err| StoreError::Io(err.to_string()))?;
        entries.push((format!("{evaluation_id}/{BUNDLE_MANIFEST_NAME}"), bytes));
    }

    entries.sort_by(|left, right| left.0.cmp(&right.0));

    write_archive(&entries)
}

/// Writes the sorted entries into a ZIP archive with fixed metadata.
fn write_archive(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, StoreError> {
    let fixed_time = DateTime::from_date_and_time(2000, 1, 1, 0, 0, 0)
        .map_err(|err| StoreError::Io(format!("fixed bundle timestamp invalid: {err}")))?;
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(BUNDLE_COMPRESSION_LEVEL))
        .last_modified_time(fixed_time);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        writer
            .start_file(name.clone(), options)
            .map_err(|err| StoreError::Io(err.to_string()))?;
        writer.write_all(bytes).map_err(|err| StoreError::Io(err.to_string()))?;
    }
    let cursor = writer.finish().map_err(|err| StoreError::Io(err.to_string()))?;
    Ok(cursor.into_inner())
}
