//! Unified diff rendering for dry-run previews.

use std::io::ErrorKind;
use std::path::Path;

use similar::TextDiff;

use regen_core::SyncPlan;

use crate::error::{io_err, SyncError};

/// A single pending file change rendered as a unified diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub rel_path: String,
    pub unified_diff: String,
}

/// Render what applying `plan` would change on disk, without writing.
///
/// Writes diff staged content against current on-disk content (empty for
/// new files); deletions diff current content against empty. Binary-ish
/// content that is not valid UTF-8 gets a one-line placeholder instead of
/// a line diff.
pub fn diff_plan(plan: &SyncPlan, output_dir: &Path) -> Result<Vec<FileDiff>, SyncError> {
    let mut diffs = Vec::new();

    for file in &plan.to_write {
        let target = output_dir.join(&file.rel_path);
        let existing_bytes = read_existing(&target)?;
        if existing_bytes.as_deref() == Some(file.content.as_slice()) {
            continue;
        }
        let staged = std::str::from_utf8(&file.content).ok();
        let existing = match &existing_bytes {
            Some(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => Some(text),
                Err(_) => None,
            },
            None => Some(""),
        };
        let (Some(staged), Some(existing)) = (staged, existing) else {
            // Either side is not valid UTF-8: no line diff to show.
            diffs.push(FileDiff {
                rel_path: file.rel_path.clone(),
                unified_diff: format!("Binary file {} differs\n", file.rel_path),
            });
            continue;
        };
        let staged = normalize_line_endings(staged);
        let existing = normalize_line_endings(existing);
        if existing == staged {
            continue;
        }
        diffs.push(FileDiff {
            rel_path: file.rel_path.clone(),
            unified_diff: render_unified(&file.rel_path, &existing, &staged),
        });
    }

    for rel_path in &plan.to_delete {
        let target = output_dir.join(rel_path);
        let existing_bytes = read_existing(&target)?.unwrap_or_default();
        let unified_diff = match std::str::from_utf8(&existing_bytes) {
            Ok(text) => render_unified(rel_path, &normalize_line_endings(text), ""),
            Err(_) => format!("Binary file {rel_path} differs\n"),
        };
        diffs.push(FileDiff {
            rel_path: rel_path.clone(),
            unified_diff,
        });
    }

    Ok(diffs)
}

fn render_unified(rel_path: &str, old: &str, new: &str) -> String {
    let old_header = format!("a/{rel_path}");
    let new_header = format!("b/{rel_path}");
    TextDiff::from_lines(old, new)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string()
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, SyncError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}
