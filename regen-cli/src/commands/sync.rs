//! `regen sync` — one resolve/generate/apply cycle.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use regen_core::SpecOrigin;
use regen_sync::{pipeline, CycleResult};

use super::GeneratorArgs;

/// Arguments for `regen sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Spec to generate from: a local file path or an http(s) URL.
    pub spec: String,

    /// Directory the generated tree is synchronized into.
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub generator: GeneratorArgs,

    /// Show what would change without writing any files.
    #[arg(long)]
    pub dry_run: bool,

    /// With --dry-run, print unified diffs of pending changes.
    #[arg(long, requires = "dry_run")]
    pub diff: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = self.generator.build_config()?;
        let generator = self.generator.build_generator(&config);
        let origin = SpecOrigin::parse(&self.spec);

        let result = pipeline::run_once(
            &origin,
            &self.output_dir,
            self.generator.template_dir.as_deref(),
            &generator,
            &config,
            self.dry_run,
        )
        .with_context(|| format!("sync failed for '{origin}'"))?;

        print_result(&origin, &result);
        if self.diff {
            for diff in &result.diffs {
                print!("{}", diff.unified_diff);
            }
        }
        Ok(())
    }
}

fn print_result(origin: &SpecOrigin, result: &CycleResult) {
    let prefix = if result.dry_run { "[dry-run] " } else { "" };

    if result.generation_skipped {
        println!("{prefix}✓ '{origin}' unchanged since last sync — generation skipped");
        return;
    }
    if result.is_noop() {
        println!(
            "{prefix}✓ '{origin}' — nothing to do ({} unchanged)",
            result.unchanged
        );
        return;
    }

    println!(
        "{prefix}✓ '{origin}' synced ({} written, {} deleted, {} unchanged)",
        result.written.len(),
        result.deleted.len(),
        result.unchanged
    );
    for path in &result.written {
        println!("  ✎  {path}");
    }
    for path in &result.deleted {
        println!("  ✗  {path}");
    }
}
