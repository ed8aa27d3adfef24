//! Regen — keep generated code in sync with its spec.
//!
//! # Usage
//!
//! ```text
//! regen sync <spec> <output-dir> --generator <program> [--dry-run [--diff]]
//! regen watch <spec> <output-dir> --generator <program>
//! regen status <output-dir> [--json]
//! ```
//!
//! `<spec>` is a local path or an `http(s)://` URL. The generator is any
//! external program that reads a spec file and writes a file tree;
//! customize its invocation with repeated `--generator-arg` values
//! containing `{input}`, `{output}`, and `{template}` placeholders.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{status::StatusArgs, sync::SyncArgs, watch::WatchArgs};

#[derive(Parser, Debug)]
#[command(
    name = "regen",
    version,
    about = "Change-detecting synchronizer for generated code",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one sync cycle: generate from the spec and apply the minimal
    /// set of writes and deletes to the output directory.
    Sync(SyncArgs),

    /// Watch a local spec file and re-sync whenever it changes.
    Watch(WatchArgs),

    /// Show what the output directory's manifest recorded at last sync.
    Status(StatusArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Watch(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
