//! Timestamped snapshots of the target tree's tracked subset.
//!
//! Created before any destructive sync/restore/install; never auto-deleted.

use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::walk::{copy_recursive, is_noise_entry};

/// What a backup snapshots: every category, the sound assets, and the
/// settings document.
pub const TRACKED_ITEMS: &[&str] = &[
    "commands",
    "agents",
    "skills",
    "scripts",
    "song",
    "settings.json",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

#[derive(Debug, Clone)]
pub struct BackupInfo {
    /// Directory name, the formatted timestamp.
    pub name: String,
    pub path: PathBuf,
    pub timestamp: NaiveDateTime,
}

pub struct BackupManager {
    root: PathBuf,
}

impl BackupManager {
    pub fn new(root: PathBuf) -> BackupManager {
        BackupManager { root }
    }

    /// `~/.config/ccsync/backup`.
    pub fn default_root() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SyncError::Config("cannot determine home directory".to_string()))?;
        Ok(home.join(".config").join("ccsync").join("backup"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot the target's tracked subset into a new timestamp-named
    /// directory. Returns `None` without creating anything when the target
    /// is missing or holds nothing but noise entries.
    pub fn create(&self, target_dir: &Path) -> Result<Option<PathBuf>> {
        if !target_dir.is_dir() {
            return Ok(None);
        }
        let has_content = fs::read_dir(target_dir)?
            .filter_map(|e| e.ok())
            .any(|e| !is_noise_entry(&e.file_name()));
        if !has_content {
            return Ok(None);
        }

        let name = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        let backup_path = self.root.join(&name);
        fs::create_dir_all(&backup_path)?;

        for item in TRACKED_ITEMS {
            let source = target_dir.join(item);
            if source.exists() {
                copy_recursive(&source, &backup_path.join(item))?;
            }
        }

        tracing::info!(path = %backup_path.display(), "backup created");
        Ok(Some(backup_path))
    }

    /// All backups, newest first. Directory names that do not parse as a
    /// timestamp are ignored.
    pub fn list(&self) -> Result<Vec<BackupInfo>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Ok(timestamp) = NaiveDateTime::parse_from_str(&name, TIMESTAMP_FORMAT) {
                backups.push(BackupInfo {
                    name,
                    path: entry.path(),
                    timestamp,
                });
            }
        }
        backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(backups)
    }

    pub fn find(&self, name: &str) -> Result<Option<BackupInfo>> {
        Ok(self.list()?.into_iter().find(|b| b.name == name))
    }

    /// Copy the backup's tracked subset over the target, overwriting.
    /// Callers wanting rollback-of-rollback must snapshot current state
    /// first; this method does not.
    pub fn restore(&self, backup_path: &Path, target_dir: &Path) -> Result<()> {
        fs::create_dir_all(target_dir)?;
        for item in TRACKED_ITEMS {
            let source = backup_path.join(item);
            if source.exists() {
                copy_recursive(&source, &target_dir.join(item))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed_target(target: &Path) {
        fs::create_dir_all(target.join("commands")).unwrap();
        fs::create_dir_all(target.join("scripts/hooks")).unwrap();
        fs::write(target.join("commands/a.md"), "alpha").unwrap();
        fs::write(target.join("scripts/hooks/h.ts"), "hook body").unwrap();
        fs::write(target.join("settings.json"), "{\"hooks\":{}}").unwrap();
    }

    #[test]
    fn test_round_trip_reproduces_tracked_subset() {
        let root = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        seed_target(target.path());

        let manager = BackupManager::new(root.path().to_path_buf());
        let backup = manager.create(target.path()).unwrap().unwrap();

        let restored = TempDir::new().unwrap();
        manager.restore(&backup, restored.path()).unwrap();

        assert_eq!(
            fs::read_to_string(restored.path().join("commands/a.md")).unwrap(),
            "alpha"
        );
        assert_eq!(
            fs::read_to_string(restored.path().join("scripts/hooks/h.ts")).unwrap(),
            "hook body"
        );
        assert_eq!(
            fs::read_to_string(restored.path().join("settings.json")).unwrap(),
            "{\"hooks\":{}}"
        );
    }

    #[test]
    fn test_missing_target_yields_no_backup() {
        let root = TempDir::new().unwrap();
        let manager = BackupManager::new(root.path().to_path_buf());
        assert!(manager
            .create(Path::new("/nonexistent/ccsync-target"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_noise_only_target_yields_no_backup() {
        let root = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        fs::write(target.path().join(".DS_Store"), "").unwrap();

        let manager = BackupManager::new(root.path().to_path_buf());
        assert!(manager.create(target.path()).unwrap().is_none());
        assert!(manager.list().unwrap().is_empty());
    }

    #[test]
    fn test_untracked_entries_excluded_from_backup() {
        let root = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        seed_target(target.path());
        fs::create_dir_all(target.path().join("projects")).unwrap();
        fs::write(target.path().join("projects/private.md"), "secret").unwrap();

        let manager = BackupManager::new(root.path().to_path_buf());
        let backup = manager.create(target.path()).unwrap().unwrap();
        assert!(!backup.join("projects").exists());
    }

    #[test]
    fn test_list_newest_first_ignoring_foreign_names() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("2025-01-02-10-00-00")).unwrap();
        fs::create_dir_all(root.path().join("2025-06-15-08-30-00")).unwrap();
        fs::create_dir_all(root.path().join("not-a-backup")).unwrap();

        let manager = BackupManager::new(root.path().to_path_buf());
        let backups = manager.list().unwrap();
        assert_eq!(backups.len(), 2);
        assert_eq!(backups[0].name, "2025-06-15-08-30-00");
        assert_eq!(backups[1].name, "2025-01-02-10-00-00");
    }
}
