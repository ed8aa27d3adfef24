//! Manifest — the persisted record of what the synchronizer owns.
//!
//! A JSON document at `<output_dir>/.regen-manifest.json` mapping
//! relative file paths to their last-applied normalized SHA-256 digest,
//! plus the spec identity and sync time of the last successful cycle.
//! Writes use the same atomic `.tmp` + rename pattern as output files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, SyncError};

pub const MANIFEST_FILE: &str = ".regen-manifest.json";

/// On-disk manifest payload.
///
/// `files` is a `BTreeMap` so serialization order is deterministic and
/// manifest diffs stay readable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub synced_at: DateTime<Utc>,
    /// Content hash of the spec last applied successfully; used to skip
    /// regeneration for byte-identical remote content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_hash: Option<String>,
    pub files: BTreeMap<String, String>,
}

impl Manifest {
    pub fn empty() -> Self {
        Self {
            synced_at: Utc::now(),
            spec_hash: None,
            files: BTreeMap::new(),
        }
    }
}

/// Path to the manifest inside `output_dir`.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILE)
}

/// Load the manifest for `output_dir`.
///
/// An absent file is a first run and yields an empty manifest; an
/// unparseable file is a fatal error, never silently discarded.
pub fn load(output_dir: &Path) -> Result<Manifest, SyncError> {
    let path = manifest_path(output_dir);
    if !path.exists() {
        return Ok(Manifest::empty());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_json::from_str(&contents).map_err(|source| SyncError::ManifestParse { path, source })
}

/// Save the manifest atomically: write to `<path>.tmp`, then rename.
pub fn save(output_dir: &Path, manifest: &Manifest) -> Result<(), SyncError> {
    std::fs::create_dir_all(output_dir).map_err(|e| io_err(output_dir, e))?;

    let path = manifest_path(output_dir);
    let json = serde_json::to_string_pretty(manifest)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}
