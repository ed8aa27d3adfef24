//! # regen-watch
//!
//! Debounced watch loop: polls a local spec file for content changes and
//! re-runs the sync pipeline once the file settles, so a burst of editor
//! saves triggers exactly one regeneration.

pub mod error;
pub mod runtime;

pub use error::WatchError;
pub use runtime::{run, start_blocking, CycleEvent, WatchOptions};
