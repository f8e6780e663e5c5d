//! Selective application of an approved change set.
//!
//! Trusts its input: selection filtering happens in the command layer. File
//! failures are per-item and never abort the batch; the settings document is
//! written once, after all selected hooks are merged.

use std::fs;
use std::path::Path;

use crate::classify::{HookSyncItem, ItemStatus, SyncItem};
use crate::error::Result;
use crate::github::RemoteClient;
use crate::settings::Settings;
use crate::transform::{is_text_file, Transformer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyAction {
    Adding,
    Updating,
    Deleting,
}

impl ApplyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyAction::Adding => "adding",
            ApplyAction::Updating => "updating",
            ApplyAction::Deleting => "deleting",
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ApplyStats {
    pub success: usize,
    pub failed: usize,
    pub deleted: usize,
}

impl ApplyStats {
    pub fn merge(&mut self, other: ApplyStats) {
        self.success += other.success;
        self.failed += other.failed;
        self.deleted += other.deleted;
    }
}

/// Download and write (or delete) every selected item. Best-effort: each
/// failure is logged, counted, and the batch continues.
pub async fn apply_items(
    client: &RemoteClient,
    transformer: &Transformer,
    target_dir: &Path,
    items: &[SyncItem],
    mut progress: impl FnMut(&str, ApplyAction),
) -> Result<ApplyStats> {
    let mut stats = ApplyStats::default();

    for item in items {
        let target_path = target_dir.join(&item.relative_path);
        match item.status {
            ItemStatus::Deleted => {
                progress(&item.relative_path, ApplyAction::Deleting);
                let removed = if item.is_folder {
                    fs::remove_dir_all(&target_path)
                } else {
                    fs::remove_file(&target_path)
                };
                match removed {
                    Ok(()) => stats.deleted += 1,
                    Err(e) => {
                        tracing::warn!(path = %item.relative_path, error = %e, "delete failed");
                        stats.failed += 1;
                    }
                }
            }
            ItemStatus::New | ItemStatus::Modified => {
                let action = if item.status == ItemStatus::New {
                    ApplyAction::Adding
                } else {
                    ApplyAction::Updating
                };
                progress(&item.relative_path, action);
                match fetch_and_write(client, transformer, &target_path, &item.relative_path).await
                {
                    Ok(()) => stats.success += 1,
                    Err(e) => {
                        tracing::warn!(path = %item.relative_path, error = %e, "download failed");
                        stats.failed += 1;
                    }
                }
            }
            ItemStatus::Unchanged => {}
        }
    }

    Ok(stats)
}

async fn fetch_and_write(
    client: &RemoteClient,
    transformer: &Transformer,
    target_path: &Path,
    relative_path: &str,
) -> Result<()> {
    let bytes = client.download(relative_path).await?;
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent)?;
    }
    // Text files go through the content transformer; anything else (and
    // text files that turn out not to be UTF-8) is written verbatim.
    if is_text_file(target_path) {
        if let Ok(text) = String::from_utf8(bytes.clone()) {
            fs::write(target_path, transformer.transform_file_content(&text))?;
            return Ok(());
        }
    }
    fs::write(target_path, bytes)?;
    Ok(())
}

/// Merge every selected hook into the settings document by
/// (hook type, matcher) key. One read, one atomic write; hooks under other
/// keys and unknown top-level fields are preserved.
pub fn apply_hooks(
    target_dir: &Path,
    hooks: &[HookSyncItem],
    mut progress: impl FnMut(&str, ApplyAction),
) -> Result<ApplyStats> {
    let mut stats = ApplyStats::default();
    if hooks.is_empty() {
        return Ok(stats);
    }

    let mut settings = Settings::load(target_dir)?;
    for item in hooks {
        let action = if item.local_hook.is_some() {
            ApplyAction::Updating
        } else {
            ApplyAction::Adding
        };
        let label = format!("{}[{}]", item.hook_type, display_matcher(&item.matcher));
        progress(&label, action);
        settings.upsert_hook(&item.hook_type, item.remote_hook.clone());
        stats.success += 1;
    }
    settings.save(target_dir)?;

    Ok(stats)
}

/// Adopt the remote status line when the local settings document has none.
/// Returns whether anything was written.
pub fn adopt_status_line(
    target_dir: &Path,
    remote: &Settings,
    transformer: &Transformer,
) -> Result<bool> {
    let Some(remote_status) = &remote.status_line else {
        return Ok(false);
    };
    let mut settings = Settings::load(target_dir)?;
    if settings.status_line.is_some() {
        return Ok(false);
    }
    settings.status_line = Some(transformer.transform_status_line(remote_status));
    settings.save(target_dir)?;
    Ok(true)
}

pub fn display_matcher(matcher: &str) -> &str {
    if matcher.is_empty() {
        "*"
    } else {
        matcher
    }
}
