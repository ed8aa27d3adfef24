//! Regen core library — domain types, typed configuration, spec validation.
//!
//! Public API surface:
//! - [`types`] — spec origin/identity, staged files, sync plan
//! - [`config`] — [`SyncConfig`] with named, typed fields
//! - [`validate`] — parse-level validation of spec documents

pub mod config;
pub mod types;
pub mod validate;

pub use config::SyncConfig;
pub use types::{GeneratedFile, Spec, SpecFormat, SpecOrigin, StagedFile, SyncPlan};
pub use validate::{validate_spec_document, ValidationError};
