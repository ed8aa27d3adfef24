//! Error types for regen-sync.

use std::path::PathBuf;

use thiserror::Error;

use regen_generator::GenerateError;
use regen_resolver::ResolveError;

/// All errors that can arise from a synchronization cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error while resolving the spec.
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// An error from the generation step.
    #[error("generate error: {0}")]
    Generate(#[from] GenerateError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted manifest exists but cannot be parsed. Fatal for the
    /// cycle: proceeding with an empty manifest would re-introduce
    /// previously deleted files.
    #[error("manifest at {path} is corrupt: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error (manifest save).
    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
