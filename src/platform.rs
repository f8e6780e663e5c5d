//! Platform context: OS family, WSL detection, audio player selection.
//!
//! Detection runs once at process start; everything downstream receives the
//! resulting `Platform` value, so tests can construct arbitrary platforms
//! without touching the host.

use std::path::PathBuf;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    MacOs,
    Windows,
    Linux,
}

/// Audio players in detection-preference order per OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioPlayer {
    /// macOS built-in.
    Afplay,
    /// Windows scripting host (native).
    Powershell,
    /// sox, preferred under WSL.
    Play,
    /// WSL bridge to the Windows host.
    PowershellExe,
    Paplay,
    Aplay,
    Mpv,
    Ffplay,
}

impl AudioPlayer {
    pub fn binary(&self) -> &'static str {
        match self {
            AudioPlayer::Afplay => "afplay",
            AudioPlayer::Powershell => "powershell",
            AudioPlayer::Play => "play",
            AudioPlayer::PowershellExe => "powershell.exe",
            AudioPlayer::Paplay => "paplay",
            AudioPlayer::Aplay => "aplay",
            AudioPlayer::Mpv => "mpv",
            AudioPlayer::Ffplay => "ffplay",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Platform {
    pub os: OsFamily,
    pub is_wsl: bool,
    pub home_dir: PathBuf,
    /// `None` means "skip audio, do not fail".
    pub audio_player: Option<AudioPlayer>,
}

impl Platform {
    /// Detect the current machine. Runs `which` probes for Linux/WSL audio
    /// players; macOS and Windows players ship with the OS.
    pub fn detect() -> Self {
        let os = if cfg!(target_os = "macos") {
            OsFamily::MacOs
        } else if cfg!(target_os = "windows") {
            OsFamily::Windows
        } else {
            OsFamily::Linux
        };
        let is_wsl = os == OsFamily::Linux && kernel_release_is_wsl();
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let audio_player = detect_audio_player(os, is_wsl);

        tracing::debug!(?os, is_wsl, ?audio_player, "platform detected");

        Platform {
            os,
            is_wsl,
            home_dir,
            audio_player,
        }
    }

    /// Shell invocation that plays `sound_path`, or `None` when no player is
    /// available. Linux/WSL variants carry a `|| true` suffix so a missing
    /// player never fails the hook that embeds the command.
    pub fn play_sound_command(&self, sound_path: &str) -> Option<String> {
        let player = self.audio_player?;
        let quoted = shell_quote(sound_path);

        let cmd = match player {
            AudioPlayer::Afplay => format!("afplay -v 0.1 {quoted}"),
            AudioPlayer::Powershell => {
                let escaped = sound_path.replace('\'', "''");
                format!("powershell -c \"(New-Object Media.SoundPlayer '{escaped}').PlaySync()\"")
            }
            AudioPlayer::Play => {
                // Under WSL the Windows notification sound is the reliable
                // asset; the synced mp3 may not decode through sox.
                let path = if self.is_wsl {
                    shell_quote("/mnt/c/Windows/Media/notify.wav")
                } else {
                    quoted
                };
                format!("play -v 0.3 {path} 2>/dev/null || true")
            }
            AudioPlayer::PowershellExe => {
                let win_path = wsl_to_windows_path(sound_path).replace('\'', "''");
                format!(
                    "powershell.exe -c \"(New-Object Media.SoundPlayer '{win_path}').PlaySync()\" 2>/dev/null || true"
                )
            }
            AudioPlayer::Paplay => format!("paplay {quoted} 2>/dev/null || true"),
            AudioPlayer::Aplay => format!("aplay {quoted} 2>/dev/null || true"),
            AudioPlayer::Mpv => format!("mpv --no-video --volume=10 {quoted} 2>/dev/null || true"),
            AudioPlayer::Ffplay => {
                format!("ffplay -nodisp -autoexit -volume 10 {quoted} 2>/dev/null || true")
            }
        };
        Some(cmd)
    }
}

fn kernel_release_is_wsl() -> bool {
    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|r| {
            let r = r.to_lowercase();
            r.contains("microsoft") || r.contains("wsl")
        })
        .unwrap_or(false)
}

fn which(binary: &str) -> bool {
    Command::new("which")
        .arg(binary)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn detect_audio_player(os: OsFamily, is_wsl: bool) -> Option<AudioPlayer> {
    match os {
        OsFamily::MacOs => Some(AudioPlayer::Afplay),
        OsFamily::Windows => Some(AudioPlayer::Powershell),
        OsFamily::Linux => {
            if is_wsl {
                if which("play") {
                    return Some(AudioPlayer::Play);
                }
                if which("powershell.exe") {
                    return Some(AudioPlayer::PowershellExe);
                }
            }
            [
                AudioPlayer::Paplay,
                AudioPlayer::Aplay,
                AudioPlayer::Mpv,
                AudioPlayer::Ffplay,
            ]
            .into_iter()
            .find(|p| which(p.binary()))
        }
    }
}

/// `/mnt/c/foo/bar` → `c:\foo\bar`.
fn wsl_to_windows_path(path: &str) -> String {
    let converted = if let Some(rest) = path.strip_prefix("/mnt/") {
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(drive), Some('/')) if drive.is_ascii_lowercase() => {
                format!("{}:/{}", drive, chars.as_str())
            }
            _ => path.to_string(),
        }
    } else {
        path.to_string()
    };
    converted.replace('/', "\\")
}

/// Characters allowed to pass into a shell command unquoted. Anything
/// outside this set is rejected rather than escaped when it gets
/// interpolated into generated commands.
pub fn is_path_safe_for_shell(path: &str) -> bool {
    !path.chars().any(|c| {
        matches!(
            c,
            ';' | '&' | '|' | '`' | '$' | '(' | ')' | '{' | '}' | '[' | ']' | '<' | '>' | '*'
                | '?' | '!' | '#' | '~' | '\'' | '"' | '\\'
        )
    })
}

/// POSIX single-quote escaping.
pub fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform_with(player: Option<AudioPlayer>, is_wsl: bool) -> Platform {
        Platform {
            os: if player == Some(AudioPlayer::Afplay) {
                OsFamily::MacOs
            } else {
                OsFamily::Linux
            },
            is_wsl,
            home_dir: PathBuf::from("/home/test"),
            audio_player: player,
        }
    }

    #[test]
    fn test_no_player_means_no_command() {
        let p = platform_with(None, false);
        assert_eq!(p.play_sound_command("/x/y.mp3"), None);
    }

    #[test]
    fn test_macos_command() {
        let p = platform_with(Some(AudioPlayer::Afplay), false);
        assert_eq!(
            p.play_sound_command("/home/u/.claude/song/finish.mp3").unwrap(),
            "afplay -v 0.1 '/home/u/.claude/song/finish.mp3'"
        );
    }

    #[test]
    fn test_linux_commands_never_hard_fail() {
        for player in [
            AudioPlayer::Paplay,
            AudioPlayer::Aplay,
            AudioPlayer::Mpv,
            AudioPlayer::Ffplay,
        ] {
            let p = platform_with(Some(player), false);
            let cmd = p.play_sound_command("/tmp/a.mp3").unwrap();
            assert!(cmd.ends_with("|| true"), "{cmd}");
        }
    }

    #[test]
    fn test_wsl_powershell_bridge_converts_path() {
        let p = platform_with(Some(AudioPlayer::PowershellExe), true);
        let cmd = p.play_sound_command("/mnt/c/Users/u/sound.wav").unwrap();
        assert!(cmd.contains("c:\\Users\\u\\sound.wav"), "{cmd}");
    }

    #[test]
    fn test_shell_safety_allow_list() {
        assert!(is_path_safe_for_shell("/home/user/.claude/song/finish.mp3"));
        assert!(!is_path_safe_for_shell("/tmp/$(rm -rf)"));
        assert!(!is_path_safe_for_shell("a;b"));
    }

    #[test]
    fn test_shell_quote_embedded_quote() {
        assert_eq!(shell_quote("a'b"), "'a'\\''b'");
    }
}
