//! Error types for regen-generator.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from a generation step.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The external generator exited abnormally. Captured stdout/stderr
    /// is attached for diagnosis.
    #[error("generator exited with {status}: {diagnostics}")]
    Failed { status: String, diagnostics: String },

    /// The generator exceeded its configured wall-clock bound and was
    /// killed.
    #[error("generator timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// An I/O error while staging the spec or collecting output.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> GenerateError {
    GenerateError::Io {
        path: path.into(),
        source,
    }
}
