//! Shared sync pipeline entrypoint used by the CLI and the watch runtime.

use std::path::Path;

use chrono::Utc;

use regen_core::{Spec, SpecOrigin, SyncConfig};
use regen_generator::Generator;

use crate::diff::{self, FileDiff};
use crate::{detect, manifest, writer, SyncError};

/// Outcome of one sync cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleResult {
    /// Content hash of the resolved spec document.
    pub spec_hash: String,
    /// True when a remote spec matched the manifest and generation was
    /// skipped entirely.
    pub generation_skipped: bool,
    /// True when nothing was applied to disk.
    pub dry_run: bool,
    /// Relative paths written this cycle, in plan order.
    pub written: Vec<String>,
    /// Relative paths deleted this cycle, in plan order.
    pub deleted: Vec<String>,
    /// Count of generated files whose normalized hash already matched.
    pub unchanged: usize,
    /// Unified diffs of pending changes. Populated on dry runs only.
    pub diffs: Vec<FileDiff>,
}

impl CycleResult {
    pub fn is_noop(&self) -> bool {
        self.written.is_empty() && self.deleted.is_empty()
    }
}

/// Run one full sync cycle: resolve the spec, invoke the generator,
/// detect changes, and apply the minimal plan.
///
/// This is the canonical entrypoint for both `regen sync` and the watch
/// runtime.
pub fn run_once(
    origin: &SpecOrigin,
    output_dir: &Path,
    template_dir: Option<&Path>,
    generator: &dyn Generator,
    config: &SyncConfig,
    dry_run: bool,
) -> Result<CycleResult, SyncError> {
    let spec = regen_resolver::resolve(origin, config)?;
    run_resolved(&spec, output_dir, template_dir, generator, config, dry_run)
}

/// Run a sync cycle for an already-resolved spec.
///
/// Remote specs whose content hash matches the last persisted manifest
/// short-circuit before the generator runs; local specs always generate,
/// since templates or the generator itself may have changed underneath
/// an unchanged spec file.
pub fn run_resolved(
    spec: &Spec,
    output_dir: &Path,
    template_dir: Option<&Path>,
    generator: &dyn Generator,
    config: &SyncConfig,
    dry_run: bool,
) -> Result<CycleResult, SyncError> {
    let cycle_started_at = Utc::now();
    let manifest = manifest::load(output_dir)?;

    if spec.origin.is_remote() && manifest.spec_hash.as_deref() == Some(&spec.content_hash) {
        tracing::info!(
            "spec unchanged since last sync ({}), skipping generation",
            &spec.content_hash[..12.min(spec.content_hash.len())]
        );
        return Ok(CycleResult {
            spec_hash: spec.content_hash.clone(),
            generation_skipped: true,
            dry_run,
            written: Vec::new(),
            deleted: Vec::new(),
            unchanged: manifest.files.len(),
            diffs: Vec::new(),
        });
    }

    let staged = regen_generator::invoke(generator, spec, template_dir)?;
    let files = detect::fingerprint(staged, &config.volatile_patterns);
    let detection = detect::detect(files, &manifest);
    tracing::info!(
        "plan: {} to write, {} to delete, {} unchanged",
        detection.plan.to_write.len(),
        detection.plan.to_delete.len(),
        detection.unchanged
    );

    let written: Vec<String> = detection
        .plan
        .to_write
        .iter()
        .map(|f| f.rel_path.clone())
        .collect();
    let deleted = detection.plan.to_delete.clone();

    let diffs = if dry_run {
        diff::diff_plan(&detection.plan, output_dir)?
    } else if detection.plan.is_empty()
        && manifest.spec_hash.as_deref() == Some(&spec.content_hash)
    {
        // Nothing to apply and the manifest already records this spec:
        // leave the filesystem untouched, manifest included.
        Vec::new()
    } else {
        writer::apply(
            &detection.plan,
            detection.snapshot,
            output_dir,
            &spec.content_hash,
            cycle_started_at,
        )?;
        Vec::new()
    };

    Ok(CycleResult {
        spec_hash: spec.content_hash.clone(),
        generation_skipped: false,
        dry_run,
        written,
        deleted,
        unchanged: detection.unchanged,
        diffs,
    })
}
