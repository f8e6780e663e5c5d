//! Rewrites remote-authored commands and file contents for the local
//! machine.
//!
//! Hook commands and scripts in the upstream repo carry the author's
//! absolute home directory and audio invocations for the author's OS. The
//! transformer substitutes the local target directory for any known
//! home-directory layout and regenerates audio playback for the detected
//! player. Pure string rewriting: no network, no filesystem.

use regex::{NoExpand, Regex};
use std::path::Path;

use crate::platform::{is_path_safe_for_shell, Platform};
use crate::settings::{HookEntry, StatusLine};

/// Home-directory layouts the upstream repo's authors are known to use.
const HOME_PATTERNS: &[&str] = &[
    r"/Users/[^/]+/\.claude/",
    r"/home/[^/]+/\.claude/",
    r"/root/\.claude/",
    r"(?i)C:\\Users\\[^\\]+\\\.claude\\",
];

const SOUND_FILE_PATTERN: &str = r#"(?:finish\.mp3|need-human\.mp3|[^'"\s]+\.(?:mp3|wav))"#;

/// Audio invocations as they appear inside downloaded script files.
const EMBEDDED_AUDIO_PATTERNS: &[&str] = &[
    r"afplay\s+-v\s+[\d.]+\s+'[^']+'",
    r"afplay\s+'[^']+'",
    r"paplay\s+'[^']+'",
    r"aplay\s+'[^']+'",
    r"mpv\s+--no-video[^']*'[^']+'",
    r"ffplay\s+-nodisp[^']*'[^']+'",
];

const TEXT_FILE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "json", "jsonl", "md", "mdx", "txt", "sh", "bash",
    "zsh", "yaml", "yml", "toml", "ini", "cfg", "html", "css", "scss", "less",
];

/// True when the file may be run through the content transformer. Binary
/// payloads (sounds, images) must be written byte-for-byte.
pub fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            TEXT_FILE_EXTENSIONS.iter().any(|t| *t == ext)
        })
        .unwrap_or(false)
}

pub struct Transformer {
    platform: Platform,
    /// Forward-slash form, no trailing slash.
    target_dir: String,
    home_patterns: Vec<Regex>,
    audio_command: Regex,
    sound_file: Regex,
    embedded_audio: Vec<Regex>,
}

impl Transformer {
    pub fn new(platform: &Platform, target_dir: &Path) -> Transformer {
        let mut target = target_dir.to_string_lossy().replace('\\', "/");
        while target.ends_with('/') {
            target.pop();
        }
        Transformer {
            platform: platform.clone(),
            target_dir: target,
            home_patterns: HOME_PATTERNS
                .iter()
                .map(|p| Regex::new(p).expect("static pattern"))
                .collect(),
            audio_command: Regex::new(r"^(afplay|paplay|aplay|mpv|ffplay|powershell)\s")
                .expect("static pattern"),
            sound_file: Regex::new(SOUND_FILE_PATTERN).expect("static pattern"),
            embedded_audio: EMBEDDED_AUDIO_PATTERNS
                .iter()
                .map(|p| Regex::new(p).expect("static pattern"))
                .collect(),
        }
    }

    /// Substitute any known home-directory prefix with the local target
    /// directory, then normalize remaining backslashes. Idempotent.
    pub fn transform_path(&self, text: &str) -> String {
        let mut out = text.to_string();
        let replacement = format!("{}/", self.target_dir);
        for pattern in &self.home_patterns {
            out = pattern.replace_all(&out, NoExpand(&replacement)).into_owned();
        }
        out.replace('\\', "/")
    }

    /// Rewrite one hook command string. Audio invocations are regenerated
    /// wholesale for the local player; everything else only gets the path
    /// substitution.
    pub fn transform_command(&self, command: &str) -> String {
        let transformed = self.transform_path(command);
        if self.audio_command.is_match(&transformed) {
            if let Some(regenerated) = self.transform_audio_command(&transformed) {
                return regenerated;
            }
        }
        transformed
    }

    /// Build a local playback invocation for the sound file referenced in
    /// `command`. `None` when no sound file is found, the resolved path
    /// fails the shell allow-list, or this machine has no audio player.
    pub fn transform_audio_command(&self, command: &str) -> Option<String> {
        let sound_file = self.sound_file.find(command)?.as_str();
        let sound_path = if sound_file.contains('/') {
            sound_file.to_string()
        } else {
            format!("{}/song/{}", self.target_dir, sound_file)
        };
        if !is_path_safe_for_shell(&sound_path) {
            return None;
        }
        self.platform.play_sound_command(&sound_path)
    }

    /// Transform every command in a hook declaration, including nested
    /// sub-hooks at any depth. The returned entry keeps matcher and
    /// unknown fields.
    pub fn transform_hook(&self, entry: &HookEntry) -> HookEntry {
        let mut out = entry.clone();
        for hook in &mut out.hooks {
            hook.command = self.transform_command(&hook.command);
            self.transform_map(&mut hook.extra);
        }
        self.transform_map(&mut out.extra);
        out
    }

    /// Depth-first rewrite of every `command` string in a leftover bag.
    /// Upstream declarations sometimes nest whole hook objects inside
    /// unknown fields; those commands need the same substitution.
    fn transform_map(&self, map: &mut serde_json::Map<String, serde_json::Value>) {
        for (key, value) in map.iter_mut() {
            if key == "command" {
                if let serde_json::Value::String(cmd) = value {
                    *cmd = self.transform_command(cmd);
                    continue;
                }
            }
            self.transform_value(value);
        }
    }

    fn transform_value(&self, value: &mut serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => self.transform_map(map),
            serde_json::Value::Array(items) => {
                for item in items {
                    self.transform_value(item);
                }
            }
            _ => {}
        }
    }

    pub fn transform_status_line(&self, status_line: &StatusLine) -> StatusLine {
        let mut out = status_line.clone();
        out.command = self.transform_command(&out.command);
        out
    }

    /// Transform a downloaded text file: path substitution plus rewriting of
    /// embedded audio invocations. Callers gate on [`is_text_file`].
    pub fn transform_file_content(&self, content: &str) -> String {
        let mut out = self.transform_path(content);
        for pattern in &self.embedded_audio {
            out = pattern
                .replace_all(&out, |caps: &regex::Captures| {
                    let original = caps.get(0).expect("whole match").as_str();
                    self.transform_audio_command(original)
                        .unwrap_or_else(|| original.to_string())
                })
                .into_owned();
        }
        out
    }
}
