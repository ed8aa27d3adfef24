//! Output synchronizer — atomic per-file plan application.
//!
//! ## Apply protocol
//!
//! 1. Ensure the output directory exists.
//! 2. For each write: parent dirs → `<path>.regen.tmp` → rename.
//! 3. For each delete: remove, tolerating already-missing files, then
//!    prune empty parent directories up to the output root.
//! 4. Only after every operation succeeds: persist the updated manifest.
//!
//! A failure in step 2 or 3 aborts the cycle with the manifest untouched;
//! re-running recomputes the remaining delta from the old manifest, so a
//! partially applied cycle heals on the next run.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use regen_core::SyncPlan;

use crate::error::{io_err, SyncError};
use crate::manifest::{self, Manifest};

/// Apply `plan` to `output_dir` and persist the post-cycle manifest.
///
/// `snapshot` is the full fingerprint set of the staged generation (not
/// just the written files); after a successful apply the manifest equals
/// it exactly. Returns the persisted manifest.
pub fn apply(
    plan: &SyncPlan,
    snapshot: BTreeMap<String, String>,
    output_dir: &Path,
    spec_hash: &str,
    cycle_started_at: DateTime<Utc>,
) -> Result<Manifest, SyncError> {
    std::fs::create_dir_all(output_dir).map_err(|e| io_err(output_dir, e))?;

    for file in &plan.to_write {
        let target = output_dir.join(&file.rel_path);
        atomic_write(&target, &file.content)?;
        tracing::info!("wrote: {}", file.rel_path);
    }

    for rel_path in &plan.to_delete {
        let target = output_dir.join(rel_path);
        remove_idempotent(&target)?;
        prune_empty_parents(&target, output_dir)?;
        tracing::info!("deleted: {rel_path}");
    }

    let updated = Manifest {
        synced_at: cycle_started_at,
        spec_hash: Some(spec_hash.to_string()),
        files: snapshot,
    };
    manifest::save(output_dir, &updated)?;
    Ok(updated)
}

/// Write `content` to a same-directory `.regen.tmp` sibling and rename it
/// into place, so a crash mid-write never exposes a truncated file under
/// its final name.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let tmp = PathBuf::from(format!("{}.regen.tmp", path.display()));
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

/// Delete a file, treating "already gone" as success.
fn remove_idempotent(path: &Path) -> Result<(), SyncError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Remove now-empty directories left behind by a deletion, stopping at
/// the output root. Non-empty directories end the walk.
fn prune_empty_parents(deleted: &Path, output_dir: &Path) -> Result<(), SyncError> {
    let mut current = deleted.parent();
    while let Some(dir) = current {
        if dir == output_dir || !dir.starts_with(output_dir) {
            break;
        }
        if !is_empty_dir(dir)? {
            break;
        }
        std::fs::remove_dir(dir).map_err(|e| io_err(dir, e))?;
        current = dir.parent();
    }
    Ok(())
}

fn is_empty_dir(dir: &Path) -> Result<bool, SyncError> {
    let mut entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    Ok(entries.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regen_core::GeneratedFile;
    use std::fs;
    use tempfile::TempDir;

    fn generated(rel_path: &str, content: &str) -> GeneratedFile {
        GeneratedFile {
            rel_path: rel_path.to_string(),
            content: content.as_bytes().to_vec(),
            normalized_hash: format!("hash-of-{rel_path}"),
        }
    }

    fn snapshot_of(plan: &SyncPlan) -> BTreeMap<String, String> {
        plan.to_write
            .iter()
            .map(|f| (f.rel_path.clone(), f.normalized_hash.clone()))
            .collect()
    }

    #[test]
    fn apply_writes_files_and_persists_manifest() {
        let _ = env_logger::builder().is_test(true).try_init();
        let out = TempDir::new().unwrap();
        let plan = SyncPlan {
            to_write: vec![generated("a.py", "a\n"), generated("pkg/b.py", "b\n")],
            to_delete: vec![],
        };

        let manifest = apply(&plan, snapshot_of(&plan), out.path(), "spec1", Utc::now()).unwrap();

        assert_eq!(fs::read_to_string(out.path().join("a.py")).unwrap(), "a\n");
        assert_eq!(
            fs::read_to_string(out.path().join("pkg/b.py")).unwrap(),
            "b\n"
        );
        assert_eq!(manifest.files.len(), 2);
        assert_eq!(manifest.spec_hash.as_deref(), Some("spec1"));

        let persisted = manifest::load(out.path()).unwrap();
        assert_eq!(persisted, manifest);
    }

    #[test]
    fn tmp_files_are_cleaned_up() {
        let out = TempDir::new().unwrap();
        let plan = SyncPlan {
            to_write: vec![generated("clean.py", "x\n")],
            to_delete: vec![],
        };
        apply(&plan, snapshot_of(&plan), out.path(), "s", Utc::now()).unwrap();
        assert!(!out.path().join("clean.py.regen.tmp").exists());
    }

    #[test]
    fn delete_is_idempotent() {
        let out = TempDir::new().unwrap();
        let plan = SyncPlan {
            to_write: vec![],
            to_delete: vec!["never-existed.py".to_string()],
        };
        apply(&plan, BTreeMap::new(), out.path(), "s", Utc::now())
            .expect("deleting a missing file is a no-op");
    }

    #[test]
    fn delete_prunes_empty_directories() {
        let out = TempDir::new().unwrap();
        let nested = out.path().join("pkg").join("sub");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("gone.py"), "x").unwrap();

        let plan = SyncPlan {
            to_write: vec![],
            to_delete: vec!["pkg/sub/gone.py".to_string()],
        };
        apply(&plan, BTreeMap::new(), out.path(), "s", Utc::now()).unwrap();

        assert!(!out.path().join("pkg").exists(), "emptied dirs pruned");
        assert!(out.path().exists(), "output root never removed");
    }

    #[test]
    fn delete_keeps_non_empty_directories() {
        let out = TempDir::new().unwrap();
        let pkg = out.path().join("pkg");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("gone.py"), "x").unwrap();
        fs::write(pkg.join("stays.py"), "y").unwrap();

        let plan = SyncPlan {
            to_write: vec![],
            to_delete: vec!["pkg/gone.py".to_string()],
        };
        apply(&plan, BTreeMap::new(), out.path(), "s", Utc::now()).unwrap();

        assert!(pkg.join("stays.py").exists());
    }

    #[test]
    fn apply_creates_missing_output_dir() {
        let root = TempDir::new().unwrap();
        let out = root.path().join("generated");
        let plan = SyncPlan {
            to_write: vec![generated("a.py", "a\n")],
            to_delete: vec![],
        };
        apply(&plan, snapshot_of(&plan), &out, "s", Utc::now()).unwrap();
        assert!(out.join("a.py").exists());
    }

    #[test]
    #[cfg(unix)]
    fn write_failure_leaves_manifest_untouched() {
        use std::os::unix::fs::PermissionsExt;

        let out = TempDir::new().unwrap();
        // Seed a manifest from an earlier successful cycle.
        let seeded = Manifest {
            synced_at: Utc::now(),
            spec_hash: Some("old".to_string()),
            files: [("kept.py".to_string(), "h1".to_string())].into(),
        };
        manifest::save(out.path(), &seeded).unwrap();

        let blocked = out.path().join("blocked");
        fs::create_dir_all(&blocked).unwrap();
        fs::set_permissions(&blocked, fs::Permissions::from_mode(0o555)).unwrap();

        let plan = SyncPlan {
            to_write: vec![generated("blocked/new.py", "x\n")],
            to_delete: vec![],
        };
        let err = apply(&plan, snapshot_of(&plan), out.path(), "new", Utc::now()).unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));

        let manifest = manifest::load(out.path()).unwrap();
        assert_eq!(manifest, seeded, "failed cycle must not move the manifest");

        fs::set_permissions(&blocked, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
