//! Change detection — normalized fingerprints and plan classification.
//!
//! Two regenerations of semantically identical content must hash
//! identically, so fingerprints are computed after stripping volatile
//! lines (generation timestamps and any other configured patterns) and
//! normalizing CRLF line endings to LF.

use std::collections::BTreeMap;

use regex::bytes::Regex;
use sha2::{Digest, Sha256};

use regen_core::{GeneratedFile, StagedFile, SyncPlan};

use crate::manifest::Manifest;

/// Result of diffing a fingerprinted generation against the manifest.
#[derive(Debug, Clone)]
pub struct Detection {
    pub plan: SyncPlan,
    /// Normalized hash of every staged file — the manifest content after
    /// a successful apply.
    pub snapshot: BTreeMap<String, String>,
    pub unchanged: usize,
}

/// Fingerprint staged files with volatile-region-aware normalized hashes.
pub fn fingerprint(staged: Vec<StagedFile>, volatile_patterns: &[Regex]) -> Vec<GeneratedFile> {
    staged
        .into_iter()
        .map(|file| {
            let normalized_hash = normalized_hash(&file.content, volatile_patterns);
            GeneratedFile {
                rel_path: file.rel_path,
                content: file.content,
                normalized_hash,
            }
        })
        .collect()
}

/// SHA-256 hex digest of `content` with volatile lines removed and CRLF
/// normalized to LF. Line-by-line so patterns stay anchored (`^...$`).
pub fn normalized_hash(content: &[u8], volatile_patterns: &[Regex]) -> String {
    let mut hasher = Sha256::new();
    for line in content.split_inclusive(|&b| b == b'\n') {
        let trimmed = strip_line_ending(line);
        if volatile_patterns.iter().any(|p| p.is_match(trimmed)) {
            continue;
        }
        hasher.update(trimmed);
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Classify every path present in the staged set or the manifest.
///
/// - staged only → Added (`to_write`)
/// - both, differing hash → Modified (`to_write`)
/// - both, equal hash → Unchanged (omitted)
/// - manifest only → Removed (`to_delete`)
///
/// Output order is sorted by path, so a fixed generation against a fixed
/// manifest always yields an identical plan.
pub fn detect(files: Vec<GeneratedFile>, manifest: &Manifest) -> Detection {
    let mut snapshot = BTreeMap::new();
    let mut to_write = Vec::new();
    let mut unchanged = 0usize;

    let mut files = files;
    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

    for file in files {
        snapshot.insert(file.rel_path.clone(), file.normalized_hash.clone());
        match manifest.files.get(&file.rel_path) {
            Some(stored) if stored == &file.normalized_hash => {
                tracing::debug!("unchanged: {}", file.rel_path);
                unchanged += 1;
            }
            _ => to_write.push(file),
        }
    }

    let to_delete: Vec<String> = manifest
        .files
        .keys()
        .filter(|path| !snapshot.contains_key(*path))
        .cloned()
        .collect();

    Detection {
        plan: SyncPlan { to_write, to_delete },
        snapshot,
        unchanged,
    }
}
