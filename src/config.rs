//! Remote source defaults, token storage, and target-directory resolution.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::github::RemoteSource;

pub const DEFAULT_REPO: &str = "aiblueprint/claude-code-config";
pub const DEFAULT_BRANCH: &str = "main";
/// Path prefix inside the repository holding the bundle.
pub const DEFAULT_BASE_PATH: &str = "claude-code-config";

/// Name of the directory synced into a project or home directory.
pub const TARGET_DIR_NAME: &str = ".claude";

fn token_file() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SyncError::Config("cannot determine home directory".to_string()))?;
    Ok(home.join(".config").join("ccsync").join("token"))
}

/// Token resolution order: explicit flag, `CCSYNC_GITHUB_TOKEN`,
/// `GITHUB_TOKEN`, then the persisted token file. `None` means public
/// access only.
pub fn resolve_token(flag: Option<String>) -> Result<Option<String>> {
    if let Some(token) = flag {
        return Ok(Some(token));
    }
    for var in ["CCSYNC_GITHUB_TOKEN", "GITHUB_TOKEN"] {
        if let Ok(token) = std::env::var(var) {
            if !token.trim().is_empty() {
                return Ok(Some(token.trim().to_string()));
            }
        }
    }
    let path = token_file()?;
    match fs::read_to_string(&path) {
        Ok(raw) => {
            let token = raw.trim().to_string();
            Ok(if token.is_empty() { None } else { Some(token) })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Persist an access token for later runs (`ccsync activate`).
pub fn save_token(token: &str) -> Result<PathBuf> {
    let path = token_file()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, format!("{}\n", token.trim()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(path)
}

/// Build the remote source from CLI overrides plus the token chain.
pub fn resolve_source(
    repo: Option<String>,
    branch: Option<String>,
    base_path: Option<String>,
    token: Option<String>,
) -> Result<RemoteSource> {
    Ok(RemoteSource::new(
        repo.unwrap_or_else(|| DEFAULT_REPO.to_string()),
        branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
        base_path.unwrap_or_else(|| DEFAULT_BASE_PATH.to_string()),
        resolve_token(token)?,
    ))
}

/// Resolve where the configuration bundle lives. An explicit `--folder`
/// wins. Otherwise a project-local `.claude` is used when the working
/// directory looks like a project (git repo or existing `.claude`), falling
/// back to the home-directory tree.
pub fn resolve_target_dir(folder: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(folder) = folder {
        return Ok(folder);
    }

    let cwd = std::env::current_dir()?;
    let local = cwd.join(TARGET_DIR_NAME);
    if cwd.join(".git").exists() || local.exists() {
        return Ok(local);
    }

    let home = dirs::home_dir()
        .ok_or_else(|| SyncError::Config("cannot determine home directory".to_string()))?;
    Ok(home.join(TARGET_DIR_NAME))
}

/// True when `dir` sits inside a directory that smells like a project
/// checkout. Used only for log context.
pub fn is_project_local(dir: &Path) -> bool {
    dir.parent().map(|p| p.join(".git").exists()).unwrap_or(false)
}
