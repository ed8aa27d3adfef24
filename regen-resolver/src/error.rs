//! Error types for regen-resolver.

use std::path::PathBuf;

use thiserror::Error;

use regen_core::ValidationError;

/// All errors that can arise while resolving a spec.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Local spec path does not exist.
    #[error("spec not found at {path}")]
    NotFound { path: PathBuf },

    /// Local spec exists but could not be read.
    #[error("failed to read spec at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Remote fetch failed after the retry budget was exhausted.
    #[error("failed to fetch spec from {url} after {attempts} attempt(s): {message}")]
    Fetch {
        url: String,
        attempts: u32,
        message: String,
    },

    /// Remote fetch exceeded its configured timeout.
    #[error("fetching spec from {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// Spec content is not a parseable structured document.
    #[error("invalid spec from {origin}: {source}")]
    Validation {
        origin: String,
        #[source]
        source: ValidationError,
    },
}
