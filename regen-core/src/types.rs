//! Domain types for the regen pipeline.
//!
//! All path fields use `PathBuf`; relative paths inside the output
//! directory are `String` keys with `/` separators so the manifest is
//! portable across platforms.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Spec origin and identity
// ---------------------------------------------------------------------------

/// Where a spec comes from: a local file or a remote HTTP(S) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecOrigin {
    Local(PathBuf),
    Remote(String),
}

impl SpecOrigin {
    /// Parse a CLI string into an origin. `http://` and `https://`
    /// prefixes mean remote; everything else is a local path.
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            SpecOrigin::Remote(value.to_owned())
        } else {
            SpecOrigin::Local(PathBuf::from(value))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SpecOrigin::Remote(_))
    }
}

impl fmt::Display for SpecOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecOrigin::Local(path) => write!(f, "{}", path.display()),
            SpecOrigin::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Structured document format of a resolved spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecFormat {
    Json,
    Yaml,
}

impl SpecFormat {
    /// File extension used when staging the spec for the generator.
    pub fn extension(&self) -> &'static str {
        match self {
            SpecFormat::Json => "json",
            SpecFormat::Yaml => "yaml",
        }
    }
}

/// A resolved spec: origin, raw bytes, and content-addressed identity.
/// Immutable once constructed; a fresh `Spec` is resolved each cycle.
#[derive(Debug, Clone)]
pub struct Spec {
    pub origin: SpecOrigin,
    pub format: SpecFormat,
    pub content: Vec<u8>,
    /// SHA-256 hex digest of the raw bytes.
    pub content_hash: String,
}

// ---------------------------------------------------------------------------
// Generator output
// ---------------------------------------------------------------------------

/// A file collected from the staging tree, before fingerprinting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Path relative to the staging (and output) root, `/`-separated.
    pub rel_path: String,
    pub content: Vec<u8>,
}

/// A staged file plus its normalized content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub rel_path: String,
    pub content: Vec<u8>,
    /// SHA-256 hex digest computed after volatile-region stripping.
    pub normalized_hash: String,
}

// ---------------------------------------------------------------------------
// Sync plan
// ---------------------------------------------------------------------------

/// The minimal set of writes and deletes that brings the output directory
/// in line with the latest generation. Both lists are sorted by path; a
/// path appears in at most one of them.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub to_write: Vec<GeneratedFile>,
    pub to_delete: Vec<String>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_write.is_empty() && self.to_delete.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_write.len() + self.to_delete.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_parse_detects_urls() {
        assert!(SpecOrigin::parse("https://example.com/api.yaml").is_remote());
        assert!(SpecOrigin::parse("http://localhost:8000/openapi.json").is_remote());
        assert!(!SpecOrigin::parse("./specs/api.yaml").is_remote());
        assert!(!SpecOrigin::parse("/abs/path/api.json").is_remote());
    }

    #[test]
    fn origin_display_roundtrips_urls() {
        let url = "https://example.com/openapi.json";
        assert_eq!(SpecOrigin::parse(url).to_string(), url);
    }

    #[test]
    fn empty_plan_reports_empty() {
        let plan = SyncPlan::default();
        assert!(plan.is_empty());
        assert_eq!(plan.len(), 0);
    }

    #[test]
    fn format_extensions() {
        assert_eq!(SpecFormat::Json.extension(), "json");
        assert_eq!(SpecFormat::Yaml.extension(), "yaml");
    }
}
