//! Error types for regen-watch.

use std::path::PathBuf;

use thiserror::Error;

use regen_sync::SyncError;

/// All errors that can arise from the watch runtime.
#[derive(Debug, Error)]
pub enum WatchError {
    /// A sync cycle failed. Resolve and generate failures are reported
    /// per cycle and do not take the loop down; this variant surfaces
    /// only for errors fatal to the runtime itself.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// An I/O error while polling the watched spec.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Watch mode needs a local file to poll.
    #[error("cannot watch remote spec {url}; watch mode requires a local spec file")]
    RemoteSpec { url: String },

    /// An internal channel closed unexpectedly.
    #[error("internal channel closed: {0}")]
    ChannelClosed(&'static str),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WatchError {
    WatchError::Io {
        path: path.into(),
        source,
    }
}
