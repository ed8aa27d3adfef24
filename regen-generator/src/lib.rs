//! # regen-generator
//!
//! The external generation capability, consumed as an opaque unit.
//!
//! [`Generator`] is a single-method trait so alternative backends can be
//! substituted without touching the synchronizer; [`CommandGenerator`]
//! runs an external program. [`invoke`] owns the staging lifecycle: a
//! fresh uniquely-named temp directory per cycle, torn down on every
//! path — success, failure, or panic — before the caller ever sees it.

mod command;
mod error;

pub use command::CommandGenerator;
pub use error::GenerateError;

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use regen_core::{Spec, StagedFile};

use crate::error::io_err;

/// An opaque spec-to-code translation backend.
///
/// Given a spec file on disk and an optional template directory, the
/// backend must produce a complete file tree under `out_dir`.
pub trait Generator {
    fn generate(
        &self,
        spec_file: &Path,
        template_dir: Option<&Path>,
        out_dir: &Path,
    ) -> Result<(), GenerateError>;
}

/// Run `generator` against `spec` in an ephemeral staging directory and
/// collect the resulting file tree.
///
/// The staging directory is never visible to callers; only the collected
/// [`StagedFile`]s leave this function. It is removed when the `TempDir`
/// drops, including on error.
pub fn invoke(
    generator: &dyn Generator,
    spec: &Spec,
    template_dir: Option<&Path>,
) -> Result<Vec<StagedFile>, GenerateError> {
    let staging = TempDir::with_prefix("regen-staging-")
        .map_err(|e| io_err("regen-staging temp dir", e))?;

    let spec_file = staging
        .path()
        .join(format!("spec.{}", spec.format.extension()));
    std::fs::write(&spec_file, &spec.content).map_err(|e| io_err(&spec_file, e))?;

    let out_dir = staging.path().join("out");
    std::fs::create_dir(&out_dir).map_err(|e| io_err(&out_dir, e))?;

    log::info!("generating code from {} into staging", spec.origin);
    generator.generate(&spec_file, template_dir, &out_dir)?;

    collect_staged_files(&out_dir)
}

/// Walk the staging output tree and collect every regular file as a
/// [`StagedFile`] with a `/`-separated relative path. Hidden
/// dot-directories (caches and the like) are skipped. Results are sorted
/// by relative path for deterministic downstream plans.
fn collect_staged_files(root: &Path) -> Result<Vec<StagedFile>, GenerateError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|e| io_err(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&dir, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;

            if file_type.is_dir() {
                if is_hidden(&path) {
                    continue;
                }
                pending.push(path);
            } else if file_type.is_file() {
                let rel_path = relative_key(root, &path);
                let content = std::fs::read(&path).map_err(|e| io_err(&path, e))?;
                files.push(StagedFile { rel_path, content });
            }
        }
    }

    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(files)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn relative_key(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut key = String::new();
    for component in rel.components() {
        if !key.is_empty() {
            key.push('/');
        }
        key.push_str(&component.as_os_str().to_string_lossy());
    }
    key
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
