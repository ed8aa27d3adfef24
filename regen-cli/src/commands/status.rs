//! `regen status` — what the last sync recorded.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use regen_sync::{manifest, Manifest};

/// Arguments for `regen status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output directory whose manifest to inspect.
    pub output_dir: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let path = manifest::manifest_path(&self.output_dir);
        if !path.exists() {
            if self.json {
                println!("{}", serde_json::json!({ "synced": false }));
            } else {
                println!(
                    "{} no manifest in {} — never synced",
                    "■".bright_black().bold(),
                    self.output_dir.display()
                );
            }
            return Ok(());
        }

        let manifest = manifest::load(&self.output_dir)
            .with_context(|| format!("failed to load manifest at {}", path.display()))?;

        if self.json {
            print_json(&manifest)?;
        } else {
            print_table(&self.output_dir, &manifest);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusJson<'a> {
    synced: bool,
    synced_at: String,
    spec_hash: Option<&'a str>,
    files: &'a std::collections::BTreeMap<String, String>,
}

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "file")]
    file: String,
    #[tabled(rename = "fingerprint")]
    fingerprint: String,
}

fn print_json(manifest: &Manifest) -> Result<()> {
    let payload = StatusJson {
        synced: true,
        synced_at: manifest.synced_at.to_rfc3339(),
        spec_hash: manifest.spec_hash.as_deref(),
        files: &manifest.files,
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn print_table(output_dir: &std::path::Path, manifest: &Manifest) {
    let age = format_age(Utc::now() - manifest.synced_at);
    println!(
        "{} {} — {} files, last synced {}",
        "■".green().bold(),
        output_dir.display(),
        manifest.files.len(),
        age
    );
    if let Some(hash) = &manifest.spec_hash {
        println!("  spec {}", short_hash(hash));
    }

    let rows: Vec<FileRow> = manifest
        .files
        .iter()
        .map(|(file, hash)| FileRow {
            file: file.clone(),
            fingerprint: short_hash(hash),
        })
        .collect();
    if rows.is_empty() {
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn short_hash(hash: &str) -> String {
    hash.chars().take(12).collect()
}

fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    if secs < 60 {
        format!("{secs}s ago")
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}
