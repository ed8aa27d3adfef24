//! # regen-resolver
//!
//! Resolves a spec origin into an immutable [`Spec`]: raw bytes plus a
//! SHA-256 content identity. Local paths are read directly; remote URLs
//! are fetched over HTTP(S) with bounded retries and exponential backoff.
//! Content is parse-validated (JSON or YAML mapping) before any
//! generation work is done with it.

mod error;

pub use error::ResolveError;

use std::io::Read;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use sha2::{Digest, Sha256};

use regen_core::{validate_spec_document, Spec, SpecOrigin, SyncConfig};

/// Upper bound on a fetched spec body. Interface descriptions are text
/// documents; anything past this is a misdirected download.
const MAX_SPEC_BYTES: u64 = 64 * 1024 * 1024;

/// Resolve `origin` into a [`Spec`].
pub fn resolve(origin: &SpecOrigin, config: &SyncConfig) -> Result<Spec, ResolveError> {
    let content = match origin {
        SpecOrigin::Local(path) => read_local(path)?,
        SpecOrigin::Remote(url) => fetch_remote(url, config)?,
    };

    let format = validate_spec_document(&content).map_err(|source| ResolveError::Validation {
        origin: origin.to_string(),
        source,
    })?;

    let content_hash = hash_bytes(&content);
    Ok(Spec {
        origin: origin.clone(),
        format,
        content,
        content_hash,
    })
}

/// SHA-256 hex digest of raw bytes — the spec's content identity.
pub fn hash_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

fn read_local(path: &Path) -> Result<Vec<u8>, ResolveError> {
    if !path.exists() {
        return Err(ResolveError::NotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read(path).map_err(|source| ResolveError::Read {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Remote fetch with bounded retries
// ---------------------------------------------------------------------------

/// Outcome of a single fetch attempt, as seen by the retry loop.
enum AttemptError {
    /// Transient: transport failure or 5xx — worth retrying.
    Transient(String),
    /// The request hit the configured timeout.
    TimedOut,
    /// Permanent: 4xx and other non-retryable statuses.
    Permanent(String),
}

fn fetch_remote(url: &str, config: &SyncConfig) -> Result<Vec<u8>, ResolveError> {
    let agent = ureq::AgentBuilder::new().timeout(config.fetch_timeout).build();
    let attempt = || fetch_once(&agent, url);
    fetch_with_retries(url, config, attempt)
}

/// Drive `attempt` up to `1 + fetch_retries` times with exponential
/// backoff between transient failures. Factored from the transport so the
/// retry policy is unit-testable.
fn fetch_with_retries<F>(
    url: &str,
    config: &SyncConfig,
    mut attempt: F,
) -> Result<Vec<u8>, ResolveError>
where
    F: FnMut() -> Result<Vec<u8>, AttemptError>,
{
    let max_attempts = config.fetch_retries.saturating_add(1);
    let mut last_message = String::new();

    for n in 0..max_attempts {
        match attempt() {
            Ok(content) => {
                log::info!("fetched spec from {url} ({} bytes)", content.len());
                return Ok(content);
            }
            Err(AttemptError::TimedOut) => {
                return Err(ResolveError::Timeout {
                    url: url.to_string(),
                    timeout_secs: config.fetch_timeout.as_secs(),
                });
            }
            Err(AttemptError::Permanent(message)) => {
                return Err(ResolveError::Fetch {
                    url: url.to_string(),
                    attempts: n + 1,
                    message,
                });
            }
            Err(AttemptError::Transient(message)) => {
                last_message = message;
                if n + 1 < max_attempts {
                    let delay = backoff_delay(config.fetch_backoff, n);
                    log::warn!(
                        "transient fetch failure for {url} (attempt {}/{max_attempts}): {last_message}; retrying in {delay:?}",
                        n + 1,
                    );
                    sleep(delay);
                }
            }
        }
    }

    Err(ResolveError::Fetch {
        url: url.to_string(),
        attempts: max_attempts,
        message: last_message,
    })
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.min(16))
}

fn fetch_once(agent: &ureq::Agent, url: &str) -> Result<Vec<u8>, AttemptError> {
    let response = match agent.get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(code, _)) if (500..600).contains(&code) => {
            return Err(AttemptError::Transient(format!("server returned {code}")));
        }
        Err(ureq::Error::Status(code, _)) => {
            return Err(AttemptError::Permanent(format!("server returned {code}")));
        }
        Err(ureq::Error::Transport(transport)) => {
            if is_timeout(&transport) {
                return Err(AttemptError::TimedOut);
            }
            return Err(AttemptError::Transient(transport.to_string()));
        }
    };

    let mut content = Vec::new();
    response
        .into_reader()
        .take(MAX_SPEC_BYTES)
        .read_to_end(&mut content)
        .map_err(|err| {
            if err.kind() == std::io::ErrorKind::TimedOut {
                AttemptError::TimedOut
            } else {
                AttemptError::Transient(err.to_string())
            }
        })?;
    Ok(content)
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    matches!(transport.kind(), ureq::ErrorKind::Io)
        && transport
            .message()
            .map(|m| m.contains("timed out") || m.contains("timeout"))
            .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
