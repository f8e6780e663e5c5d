//! Typed view of the target tree's `settings.json`.
//!
//! Known fields (`hooks`, `statusLine`) are modeled; everything else rides
//! in a leftover bag and round-trips untouched, so a merge can rewrite one
//! hook array without disturbing keys this tool does not manage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, SyncError};

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Hook-type name → ordered hook declarations.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hooks: BTreeMap<String, Vec<HookEntry>>,

    #[serde(
        rename = "statusLine",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status_line: Option<StatusLine>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One declaration inside a hook-type array. Uniqueness key within the
/// array is the matcher (empty string = unconditional).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookEntry {
    #[serde(default)]
    pub matcher: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<HookCommand>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookCommand {
    /// Always "command" in practice.
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub command: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusLine {
    #[serde(rename = "type")]
    pub kind: String,
    pub command: String,
    #[serde(default)]
    pub padding: u32,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Settings {
    /// Load from `<target>/settings.json`. A missing file is an empty
    /// document; a present-but-unparseable file is fatal, since defaulting
    /// it to empty would silently drop user configuration on the next save.
    pub fn load(target_dir: &Path) -> Result<Settings> {
        let path = target_dir.join(SETTINGS_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Settings::default())
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw).map_err(|_| SyncError::InvalidSettings(path))
    }

    /// Write back to `<target>/settings.json` via temp-file + rename.
    pub fn save(&self, target_dir: &Path) -> Result<()> {
        fs::create_dir_all(target_dir)?;
        let path = target_dir.join(SETTINGS_FILE);
        let tmp = path.with_extension("json.tmp");
        let mut body = serde_json::to_string_pretty(self)?;
        body.push('\n');
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn find_hook(&self, hook_type: &str, matcher: &str) -> Option<&HookEntry> {
        self.hooks
            .get(hook_type)?
            .iter()
            .find(|h| h.matcher == matcher)
    }

    /// Replace the entry with the same matcher in `hook_type`'s array, or
    /// append. Entries under other keys are untouched.
    pub fn upsert_hook(&mut self, hook_type: &str, entry: HookEntry) {
        let list = self.hooks.entry(hook_type.to_string()).or_default();
        match list.iter_mut().find(|h| h.matcher == entry.matcher) {
            Some(existing) => *existing = entry,
            None => list.push(entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

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
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_invalid_json_is_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{not json").unwrap();
        assert!(matches!(
            Settings::load(dir.path()),
            Err(SyncError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_unknown_keys_round_trip() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{
  "model": "opus",
  "permissions": { "allow": ["Bash"] },
  "hooks": { "Stop": [{ "matcher": "", "hooks": [{ "type": "command", "command": "echo hi", "timeout": 5 }] }] }
}"#,
        )
        .unwrap();

        let mut settings = Settings::load(dir.path()).unwrap();
        settings.upsert_hook("PreToolUse", command_hook("Bash", "validate"));
        settings.save(dir.path()).unwrap();

        let value: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(value["model"], "opus");
        assert_eq!(value["permissions"]["allow"][0], "Bash");
        // Unknown field inside a managed hook survives too.
        assert_eq!(value["hooks"]["Stop"][0]["hooks"][0]["timeout"], 5);
        assert_eq!(
            value["hooks"]["PreToolUse"][0]["hooks"][0]["command"],
            "validate"
        );
    }

    #[test]
    fn test_upsert_replaces_by_matcher() {
        let mut settings = Settings::default();
        settings.upsert_hook("PreToolUse", command_hook("Bash", "one"));
        settings.upsert_hook("PreToolUse", command_hook("Edit", "two"));
        settings.upsert_hook("PreToolUse", command_hook("Bash", "three"));

        let list = &settings.hooks["PreToolUse"];
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].hooks[0].command, "three");
        assert_eq!(list[1].hooks[0].command, "two");
    }
}
