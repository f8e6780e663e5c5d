//! Local tree enumeration.
//!
//! The walker skips the same noise entries as the remote lister so both
//! sides of a diff compare like-for-like.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::Result;

/// Entries never synced, diffed, or backed up: dependency caches and OS
/// metadata files.
pub const NOISE_ENTRIES: &[&str] = &["node_modules", ".DS_Store", "Thumbs.db", "bun.lock"];

pub fn is_noise_entry(name: &OsStr) -> bool {
    NOISE_ENTRIES.iter().any(|n| OsStr::new(n) == name)
}

/// One entry under a local root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    /// Path relative to the walked root, with `/` separators.
    pub relative_path: String,
    pub is_dir: bool,
}

/// Flat listing of everything under `root` (directories included), relative
/// paths sorted. A missing root is an empty listing, not an error.
pub fn list_local(root: &Path) -> Result<Vec<LocalEntry>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !is_noise_entry(e.file_name()))
    {
        let entry = entry.map_err(std::io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(root)
            .expect("walkdir yields paths under root");
        entries.push(LocalEntry {
            relative_path: to_slash(rel),
            is_dir: entry.file_type().is_dir(),
        });
    }

    entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(entries)
}

/// Relative path with forward slashes regardless of host OS.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Recursive copy of a file or directory, skipping noise entries.
/// Shared by backup snapshot/restore and the installer.
pub fn copy_recursive(src: &Path, dest: &Path) -> Result<()> {
    if src.is_dir() {
        std::fs::create_dir_all(dest)?;
        for entry in std::fs::read_dir(src)? {
            let entry = entry?;
            if is_noise_entry(&entry.file_name()) {
                continue;
            }
            copy_recursive(&entry.path(), &dest.join(entry.file_name()))?;
        }
    } else {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(src, dest)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let entries = list_local(&dir.path().join("nope")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_lists_files_and_dirs_skipping_noise() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub/node_modules/pkg")).unwrap();
        fs::write(dir.path().join("a.md"), "a").unwrap();
        fs::write(dir.path().join("sub/b.md"), "b").unwrap();
        fs::write(dir.path().join(".DS_Store"), "").unwrap();

        let entries = list_local(dir.path()).unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["a.md", "sub", "sub/b.md"]);
        assert!(entries[1].is_dir);
    }

    #[test]
    fn test_copy_recursive_round_trip() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("nested")).unwrap();
        fs::write(src.path().join("nested/f.txt"), "payload").unwrap();

        copy_recursive(src.path(), &dest.path().join("out")).unwrap();
        assert_eq!(
            fs::read_to_string(dest.path().join("out/nested/f.txt")).unwrap(),
            "payload"
        );
    }
}
