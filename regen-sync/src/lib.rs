//! # regen-sync
//!
//! Change detection and minimal atomic sync for generated code.
//!
//! Call [`pipeline::run_once`] to resolve a spec, run the generator, and
//! apply the minimal write/delete plan to the output directory. State
//! between cycles lives in a `.regen-manifest.json` manifest next to the
//! generated files.

pub mod detect;
pub mod diff;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod writer;

pub use detect::Detection;
pub use diff::FileDiff;
pub use error::SyncError;
pub use manifest::{Manifest, MANIFEST_FILE};
pub use pipeline::{run_once, run_resolved, CycleResult};
