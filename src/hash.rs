//! Content hashing compatible with GitHub's reported blob SHAs.
//!
//! `hash_bytes` reproduces `git hash-object`: sha1("blob " + len + "\0" + data).
//! This lets the classifier compare a local file against the contents API's
//! `sha` field without downloading the remote bytes.

use crate::error::Result;
use sha1::{Digest, Sha1};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::walk::is_noise_entry;

/// Git blob hash of a byte slice, hex-encoded.
pub fn hash_bytes(content: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", content.len()).as_bytes());
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Blob hash of a file on disk, or `None` if it cannot be read.
pub fn hash_file(path: &Path) -> Option<String> {
    fs::read(path).ok().map(|bytes| hash_bytes(&bytes))
}

/// Aggregate hash of a directory: per-file blob hashes, sorted
/// lexicographically, concatenated, re-hashed.
///
/// Returns `None` for a missing or empty directory. Order-independent by
/// construction, which also means a permutation of file *contents* across
/// paths with an unchanged hash multiset is invisible. The classifier diffs
/// per file and never relies on this; it survives as a cheap whole-tree
/// fingerprint.
pub fn hash_folder(root: &Path) -> Result<Option<String>> {
    if !root.is_dir() {
        return Ok(None);
    }

    let mut hashes = Vec::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_noise_entry(e.file_name()))
    {
        let entry = entry.map_err(|e| std::io::Error::from(e))?;
        if entry.file_type().is_file() {
            let bytes = fs::read(entry.path())?;
            hashes.push(hash_bytes(&bytes));
        }
    }

    if hashes.is_empty() {
        return Ok(None);
    }

    hashes.sort();
    let mut hasher = Sha1::new();
    hasher.update(hashes.concat().as_bytes());
    Ok(Some(hex::encode(hasher.finalize())))
}
