pub mod status;
pub mod sync;
pub mod watch;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use regen_core::SyncConfig;
use regen_generator::CommandGenerator;

/// Generator and detection flags shared by `sync` and `watch`.
#[derive(Args, Debug)]
pub struct GeneratorArgs {
    /// External generator program to invoke.
    #[arg(short, long)]
    pub generator: String,

    /// Replace the generator's argument template. Repeatable; supports
    /// `{input}`, `{output}`, and `{template}` placeholders.
    #[arg(long = "generator-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub generator_args: Vec<String>,

    /// Directory of custom generator templates.
    #[arg(long, value_name = "DIR")]
    pub template_dir: Option<std::path::PathBuf>,

    /// Extra per-line regex treated as volatile when fingerprinting
    /// generated files. Repeatable.
    #[arg(long = "ignore-pattern", value_name = "REGEX")]
    pub ignore_patterns: Vec<String>,

    /// Kill the generator if it runs longer than this many seconds.
    #[arg(long, value_name = "SECS", default_value_t = 120)]
    pub generator_timeout: u64,
}

impl GeneratorArgs {
    pub fn build_config(&self) -> Result<SyncConfig> {
        let mut config = SyncConfig {
            generator_timeout: Duration::from_secs(self.generator_timeout),
            ..SyncConfig::default()
        };
        for pattern in &self.ignore_patterns {
            config
                .add_volatile_pattern(pattern)
                .with_context(|| format!("invalid --ignore-pattern '{pattern}'"))?;
        }
        Ok(config)
    }

    pub fn build_generator(&self, config: &SyncConfig) -> CommandGenerator {
        let generator =
            CommandGenerator::new(self.generator.as_str(), config.generator_timeout);
        if self.generator_args.is_empty() {
            generator
        } else {
            generator.with_args(self.generator_args.clone())
        }
    }
}
