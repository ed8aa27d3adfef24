//! Typed pipeline configuration.
//!
//! Every knob is a named, statically-typed field. Volatile-region
//! patterns are explicit configuration so the normalization rule is
//! testable instead of being baked into the hashing step.

use std::time::Duration;

use regex::bytes::Regex;

/// Lines matching this pattern are stripped before hashing. Matches the
/// generation-timestamp comments emitted by common codegen tools,
/// e.g. `# timestamp: 2024-01-01T00:00:00`.
pub const DEFAULT_VOLATILE_PATTERN: &str = r"^\s*#\s*timestamp:.*$";

/// Configuration for one synchronizer instance.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Per-request timeout for remote spec fetches.
    pub fetch_timeout: Duration,
    /// Retry budget for transient fetch failures.
    pub fetch_retries: u32,
    /// Base delay for exponential backoff between fetch retries.
    pub fetch_backoff: Duration,
    /// Wall-clock bound on one external generator invocation.
    pub generator_timeout: Duration,
    /// Watch mode: spec file poll interval.
    pub poll_interval: Duration,
    /// Watch mode: window during which repeated changes coalesce into
    /// one regeneration trigger.
    pub debounce_window: Duration,
    /// Per-line patterns whose matches are non-semantic and excluded
    /// from content fingerprints.
    pub volatile_patterns: Vec<Regex>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            fetch_retries: 3,
            fetch_backoff: Duration::from_millis(500),
            generator_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
            debounce_window: Duration::from_millis(500),
            volatile_patterns: vec![
                Regex::new(DEFAULT_VOLATILE_PATTERN).expect("default volatile pattern is valid"),
            ],
        }
    }
}

impl SyncConfig {
    /// Append an additional volatile pattern. Returns the regex error
    /// unchanged so callers can report the offending pattern.
    pub fn add_volatile_pattern(&mut self, pattern: &str) -> Result<(), regex::Error> {
        self.volatile_patterns.push(Regex::new(pattern)?);
        Ok(())
    }
}
