//! Change classification: remote listing vs local tree, per category, plus
//! hook-level classification of the remote settings document.
//!
//! Classification is by content hash only, never mtime. Every comparison is
//! a Git blob SHA: the local side hashes bytes on disk, the remote side uses
//! the SHA the contents API already reported, so analysis downloads nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::github::{EntryKind, RemoteClient, RemoteEntry};
use crate::hash::hash_file;
use crate::settings::{HookEntry, Settings};
use crate::transform::Transformer;
use crate::walk::list_local;

/// The four tracked content groups under the target tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Commands,
    Agents,
    Skills,
    Scripts,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Commands,
        Category::Agents,
        Category::Skills,
        Category::Scripts,
    ];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Commands => "commands",
            Category::Agents => "agents",
            Category::Skills => "skills",
            Category::Scripts => "scripts",
        }
    }

    /// Categories whose change report is grouped by top-level folder.
    pub fn grouped_by_folder(&self) -> bool {
        matches!(self, Category::Skills | Category::Scripts)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    New,
    Modified,
    Unchanged,
    Deleted,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::New => "new",
            ItemStatus::Modified => "modified",
            ItemStatus::Unchanged => "unchanged",
            ItemStatus::Deleted => "deleted",
        }
    }
}

/// One file (or, for deletions, possibly a directory) inside a category.
#[derive(Debug, Clone)]
pub struct SyncItem {
    /// Path relative to the category root.
    pub name: String,
    /// `category/name`.
    pub relative_path: String,
    pub status: ItemStatus,
    pub category: Category,
    /// True only for deleted directories; live items are always files.
    pub is_folder: bool,
    pub remote_sha: Option<String>,
    pub local_sha: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStatus {
    New,
    Modified,
}

/// One hook declaration that differs from the local settings document.
/// Unchanged hooks are never surfaced. `remote_hook` is already transformed
/// for this machine, so it is both the diff preview and the exact payload
/// the applier will merge.
#[derive(Debug, Clone)]
pub struct HookSyncItem {
    pub hook_type: String,
    pub matcher: String,
    pub status: HookStatus,
    pub remote_hook: HookEntry,
    pub local_hook: Option<HookEntry>,
}

/// Full analysis output. Counts are derived from `items`, never stored.
#[derive(Debug, Default)]
pub struct SyncAnalysis {
    pub items: Vec<SyncItem>,
    pub hooks: Vec<HookSyncItem>,
}

impl SyncAnalysis {
    pub fn new_count(&self) -> usize {
        self.count(ItemStatus::New)
    }

    pub fn modified_count(&self) -> usize {
        self.count(ItemStatus::Modified)
    }

    pub fn deleted_count(&self) -> usize {
        self.count(ItemStatus::Deleted)
    }

    pub fn unchanged_count(&self) -> usize {
        self.count(ItemStatus::Unchanged)
    }

    fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    pub fn changed_items(&self) -> Vec<&SyncItem> {
        self.items
            .iter()
            .filter(|i| i.status != ItemStatus::Unchanged)
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.changed_items().is_empty() && self.hooks.is_empty()
    }
}

/// Classify one category. `remote` is a flat recursive listing with paths
/// relative to the category root; the local side is read from
/// `<target>/<category>/`.
pub fn classify_category(
    category: Category,
    remote: &[RemoteEntry],
    target_dir: &Path,
) -> Result<Vec<SyncItem>> {
    let category_root = target_dir.join(category.dir_name());

    let mut remote_files: BTreeMap<&str, &RemoteEntry> = BTreeMap::new();
    let mut remote_dirs: BTreeSet<&str> = BTreeSet::new();
    for entry in remote {
        match entry.kind {
            EntryKind::File => {
                remote_files.insert(entry.path.as_str(), entry);
            }
            EntryKind::Dir => {
                remote_dirs.insert(entry.path.as_str());
            }
        }
    }

    let mut items = Vec::new();

    for (path, entry) in &remote_files {
        let local_sha = hash_file(&category_root.join(path));
        let status = match &local_sha {
            None => ItemStatus::New,
            Some(sha) if sha == &entry.sha => ItemStatus::Unchanged,
            Some(_) => ItemStatus::Modified,
        };
        items.push(SyncItem {
            name: path.to_string(),
            relative_path: format!("{}/{}", category.dir_name(), path),
            status,
            category,
            is_folder: false,
            remote_sha: Some(entry.sha.clone()),
            local_sha,
        });
    }

    // Local paths with no remote counterpart are deletions. Lexicographic
    // order puts a directory before its children, so one pass with a list
    // of already-deleted ancestors suppresses nested entries.
    let mut deleted_dirs: Vec<String> = Vec::new();
    for local in list_local(&category_root)? {
        let path = local.relative_path.as_str();
        if deleted_dirs
            .iter()
            .any(|d| path.starts_with(d.as_str()) && path.as_bytes().get(d.len()) == Some(&b'/'))
        {
            continue;
        }
        let present_remotely = if local.is_dir {
            remote_dirs.contains(path)
                || remote_files
                    .keys()
                    .any(|f| f.starts_with(path) && f.as_bytes().get(path.len()) == Some(&b'/'))
        } else {
            remote_files.contains_key(path)
        };
        if present_remotely {
            continue;
        }
        if local.is_dir {
            deleted_dirs.push(path.to_string());
        }
        items.push(SyncItem {
            name: path.to_string(),
            relative_path: format!("{}/{}", category.dir_name(), path),
            status: ItemStatus::Deleted,
            category,
            is_folder: local.is_dir,
            remote_sha: None,
            local_sha: hash_file(&category_root.join(path)),
        });
    }

    Ok(items)
}

/// Diff the remote settings document's hooks against the local one.
/// Comparison runs on the *transformed* remote declaration; the raw remote
/// form would differ on every machine whose target directory is not the
/// author's.
pub fn classify_hooks(
    remote: &Settings,
    local: &Settings,
    transformer: &Transformer,
) -> Vec<HookSyncItem> {
    let mut out = Vec::new();
    for (hook_type, entries) in &remote.hooks {
        for entry in entries {
            let transformed = transformer.transform_hook(entry);
            match local.find_hook(hook_type, &transformed.matcher) {
                None => out.push(HookSyncItem {
                    hook_type: hook_type.clone(),
                    matcher: transformed.matcher.clone(),
                    status: HookStatus::New,
                    remote_hook: transformed,
                    local_hook: None,
                }),
                Some(existing) if *existing != transformed => out.push(HookSyncItem {
                    hook_type: hook_type.clone(),
                    matcher: transformed.matcher.clone(),
                    status: HookStatus::Modified,
                    remote_hook: transformed,
                    local_hook: Some(existing.clone()),
                }),
                Some(_) => {}
            }
        }
    }
    out
}

/// Run the full analysis: every category plus the hook diff.
pub async fn analyze(
    client: &RemoteClient,
    transformer: &Transformer,
    target_dir: &Path,
) -> Result<SyncAnalysis> {
    let mut analysis = SyncAnalysis::default();

    for category in Category::ALL {
        let prefix = format!("{}/", category.dir_name());
        let mut remote = client.list_recursive(category.dir_name()).await?;
        for entry in &mut remote {
            if let Some(stripped) = entry.path.strip_prefix(&prefix).map(str::to_string) {
                entry.path = stripped;
            }
        }
        let items = classify_category(category, &remote, target_dir)?;
        tracing::debug!(
            category = %category,
            remote_entries = remote.len(),
            classified = items.len(),
            "category classified"
        );
        analysis.items.extend(items);
    }

    if let Some(remote_settings) = client.fetch_settings().await? {
        let local_settings = Settings::load(target_dir)?;
        analysis.hooks = classify_hooks(&remote_settings, &local_settings, transformer);
    }

    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_bytes;
    use crate::platform::{OsFamily, Platform};
    use crate::settings::HookCommand;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn remote_file(path: &str, content: &[u8]) -> RemoteEntry {
        RemoteEntry {
            name: path.rsplit('/').next().unwrap().to_string(),
            path: path.to_string(),
            kind: EntryKind::File,
            sha: hash_bytes(content),
        }
    }

    fn remote_dir(path: &str) -> RemoteEntry {
        RemoteEntry {
            name: path.rsplit('/').next().unwrap().to_string(),
            path: path.to_string(),
            kind: EntryKind::Dir,
            sha: "tree".to_string(),
        }
    }

    fn statuses(items: &[SyncItem]) -> BTreeMap<String, ItemStatus> {
        items
            .iter()
            .map(|i| (i.name.clone(), i.status))
            .collect()
    }

    #[test]
    fn test_classification_completeness() {
        let target = TempDir::new().unwrap();
        let commands = target.path().join("commands");
        fs::create_dir_all(&commands).unwrap();
        fs::write(commands.join("same.md"), "alpha").unwrap();
        fs::write(commands.join("edited.md"), "local version").unwrap();
        fs::write(commands.join("gone.md"), "no remote counterpart").unwrap();

        let remote = vec![
            remote_file("same.md", b"alpha"),
            remote_file("edited.md", b"remote version"),
            remote_file("brand-new.md", b"fresh"),
        ];

        let items = classify_category(Category::Commands, &remote, target.path()).unwrap();
        let by_name = statuses(&items);

        assert_eq!(by_name["same.md"], ItemStatus::Unchanged);
        assert_eq!(by_name["edited.md"], ItemStatus::Modified);
        assert_eq!(by_name["brand-new.md"], ItemStatus::New);
        assert_eq!(by_name["gone.md"], ItemStatus::Deleted);
        assert_eq!(items.len(), 4);
    }

    #[test]
    fn test_one_byte_flip_reclassifies() {
        let target = TempDir::new().unwrap();
        let commands = target.path().join("commands");
        fs::create_dir_all(&commands).unwrap();
        fs::write(commands.join("a.md"), "identical").unwrap();

        let remote = vec![remote_file("a.md", b"identical")];
        let items = classify_category(Category::Commands, &remote, target.path()).unwrap();
        assert_eq!(items[0].status, ItemStatus::Unchanged);

        fs::write(commands.join("a.md"), "identicaX").unwrap();
        let again = classify_category(Category::Commands, &remote, target.path()).unwrap();
        assert_eq!(again[0].status, ItemStatus::Modified);
        assert_eq!(again[0].remote_sha, items[0].remote_sha);
    }

    #[test]
    fn test_nested_deletion_suppressed() {
        let target = TempDir::new().unwrap();
        let scripts = target.path().join("scripts");
        fs::create_dir_all(scripts.join("foo")).unwrap();
        fs::write(scripts.join("foo/bar.ts"), "x").unwrap();

        let items = classify_category(Category::Scripts, &[], target.path()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "foo");
        assert_eq!(items[0].status, ItemStatus::Deleted);
        assert!(items[0].is_folder);
    }

    #[test]
    fn test_dir_with_remote_children_not_deleted() {
        let target = TempDir::new().unwrap();
        let skills = target.path().join("skills");
        fs::create_dir_all(skills.join("review")).unwrap();
        fs::write(skills.join("review/SKILL.md"), "kept").unwrap();
        fs::write(skills.join("review/stale.md"), "only local").unwrap();

        let remote = vec![
            remote_dir("review"),
            remote_file("review/SKILL.md", b"kept"),
        ];
        let items = classify_category(Category::Skills, &remote, target.path()).unwrap();
        let by_name = statuses(&items);

        assert_eq!(by_name["review/SKILL.md"], ItemStatus::Unchanged);
        assert_eq!(by_name["review/stale.md"], ItemStatus::Deleted);
        // The directory itself is live, never reported.
        assert!(!by_name.contains_key("review"));
    }

    #[test]
    fn test_sibling_name_prefix_not_confused_with_ancestor() {
        let target = TempDir::new().unwrap();
        let scripts = target.path().join("scripts");
        fs::create_dir_all(&scripts).unwrap();
        fs::create_dir_all(scripts.join("foo")).unwrap();
        fs::write(scripts.join("foobar.ts"), "sibling").unwrap();

        let items = classify_category(Category::Scripts, &[], target.path()).unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        // "foobar.ts" shares a name prefix with deleted dir "foo" but is not
        // under it, so it must be reported on its own.
        assert_eq!(names, vec!["foo", "foobar.ts"]);
    }

    #[test]
    fn test_empty_remote_category_is_not_an_error() {
        let target = TempDir::new().unwrap();
        let items = classify_category(Category::Skills, &[], target.path()).unwrap();
        assert!(items.is_empty());
    }

    fn test_transformer() -> Transformer {
        let platform = Platform {
            os: OsFamily::Linux,
            is_wsl: false,
            home_dir: PathBuf::from("/home/bob"),
            audio_player: None,
        };
        Transformer::new(&platform, Path::new("/home/bob/.claude"))
    }

    fn command_hook(matcher: &str, command: &str) -> HookEntry {
        HookEntry {
            matcher: matcher.to_string(),
            hooks: vec![HookCommand {
                kind: "command".to_string(),
                command: command.to_string(),
                extra: Default::default(),
            }],
            extra: Default::default(),
        }
    }

    #[test]
    fn test_hooks_keyed_by_type_and_matcher() {
        let mut remote = Settings::default();
        remote.hooks.insert(
            "PreToolUse".to_string(),
            vec![command_hook("Bash", "bun /home/bob/.claude/scripts/v.ts")],
        );
        remote.hooks.insert(
            "Stop".to_string(),
            vec![command_hook("", "echo stop")],
        );

        let mut local = Settings::default();
        local.hooks.insert(
            "PreToolUse".to_string(),
            vec![command_hook("Bash", "bun /home/bob/.claude/scripts/v.ts")],
        );

        let hooks = classify_hooks(&remote, &local, &test_transformer());
        assert_eq!(hooks.len(), 1);
        assert_eq!(hooks[0].hook_type, "Stop");
        assert_eq!(hooks[0].status, HookStatus::New);
    }

    #[test]
    fn test_identical_after_transform_is_omitted() {
        // Remote authored on alice's machine; local already holds the
        // transformed equivalent. Must not be flagged.
        let mut remote = Settings::default();
        remote.hooks.insert(
            "PreToolUse".to_string(),
            vec![command_hook("Bash", "bun /Users/alice/.claude/scripts/v.ts")],
        );
        let mut local = Settings::default();
        local.hooks.insert(
            "PreToolUse".to_string(),
            vec![command_hook("Bash", "bun /home/bob/.claude/scripts/v.ts")],
        );

        assert!(classify_hooks(&remote, &local, &test_transformer()).is_empty());
    }

    #[test]
    fn test_changed_hook_is_modified_with_preview() {
        let mut remote = Settings::default();
        remote.hooks.insert(
            "PostToolUse".to_string(),
            vec![command_hook("Edit", "bun fmt --new-flag")],
        );
        let mut local = Settings::default();
        local.hooks.insert(
            "PostToolUse".to_string(),
            vec![command_hook("Edit", "bun fmt")],
        );

        let hooks = classify_hooks(&remote, &local, &test_transformer());
        assert_eq!(hooks.len(), 1);
        assert_eq!(hooks[0].status, HookStatus::Modified);
        assert_eq!(hooks[0].local_hook.as_ref().unwrap().hooks[0].command, "bun fmt");
        assert_eq!(hooks[0].remote_hook.hooks[0].command, "bun fmt --new-flag");
    }

    #[test]
    fn test_counts_are_derived() {
        let target = TempDir::new().unwrap();
        let commands = target.path().join("commands");
        fs::create_dir_all(&commands).unwrap();
        fs::write(commands.join("keep.md"), "k").unwrap();
        fs::write(commands.join("drop.md"), "d").unwrap();

        let remote = vec![
            remote_file("keep.md", b"k"),
            remote_file("add.md", b"a"),
        ];
        let analysis = SyncAnalysis {
            items: classify_category(Category::Commands, &remote, target.path()).unwrap(),
            hooks: Vec::new(),
        };
        assert_eq!(analysis.new_count(), 1);
        assert_eq!(analysis.deleted_count(), 1);
        assert_eq!(analysis.unchanged_count(), 1);
        assert_eq!(analysis.modified_count(), 0);
        assert_eq!(analysis.changed_items().len(), 2);
    }
}
