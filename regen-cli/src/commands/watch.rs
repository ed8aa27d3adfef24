//! `regen watch` — debounced re-sync on spec changes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;

use regen_watch::{start_blocking, WatchOptions};

use super::GeneratorArgs;

/// Arguments for `regen watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Local spec file to watch. Remote URLs are not watchable.
    pub spec: PathBuf,

    /// Directory the generated tree is synchronized into.
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub generator: GeneratorArgs,

    /// Spec poll interval in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 2000)]
    pub poll_ms: u64,

    /// Quiet window before a burst of changes triggers one cycle, in
    /// milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 500)]
    pub debounce_ms: u64,

    /// Skip the sync cycle normally run at startup.
    #[arg(long)]
    pub no_initial_sync: bool,
}

impl WatchArgs {
    pub fn run(self) -> Result<()> {
        if !self.spec.exists() {
            bail!("spec file not found: {}", self.spec.display());
        }

        let mut config = self.generator.build_config()?;
        config.poll_interval = Duration::from_millis(self.poll_ms);
        config.debounce_window = Duration::from_millis(self.debounce_ms);
        let generator = Arc::new(self.generator.build_generator(&config));

        start_blocking(WatchOptions {
            spec_path: self.spec.clone(),
            output_dir: self.output_dir,
            template_dir: self.generator.template_dir.clone(),
            generator,
            config,
            initial_sync: !self.no_initial_sync,
            events: None,
        })
        .with_context(|| format!("watch failed for '{}'", self.spec.display()))
    }
}
