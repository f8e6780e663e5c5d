//! Best-effort dependency install for synced scripts.
//!
//! Synced `scripts/` trees may carry a `package.json`; hooks written in
//! TypeScript expect their packages present. Installation is never a hard
//! prerequisite: any failure logs a warning and the sync still succeeds.

use std::path::Path;
use std::time::Duration;

use crate::error::Result;

const INSTALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Run `bun install` in `<target>/scripts` when a manifest exists and `bun`
/// is on PATH. Returns whether an install actually ran to completion.
pub async fn install_script_deps(target_dir: &Path) -> Result<bool> {
    let scripts_dir = target_dir.join("scripts");
    if !scripts_dir.join("package.json").is_file() {
        return Ok(false);
    }
    if !bun_available().await {
        tracing::warn!("bun not found on PATH, skipping script dependency install");
        return Ok(false);
    }

    Ok(run_bounded("bun", &["install"], &scripts_dir, INSTALL_TIMEOUT).await)
}

/// Run a child process under a hard deadline. The child is spawned with
/// kill-on-drop so an expired timeout actually terminates it rather than
/// leaving it running detached.
async fn run_bounded(program: &str, args: &[&str], dir: &Path, timeout: Duration) -> bool {
    let run = tokio::process::Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .kill_on_drop(true)
        .status();

    match tokio::time::timeout(timeout, run).await {
        Ok(Ok(status)) if status.success() => true,
        Ok(Ok(status)) => {
            tracing::warn!(%program, %status, "install command failed");
            false
        }
        Ok(Err(e)) => {
            tracing::warn!(%program, error = %e, "could not spawn install command");
            false
        }
        Err(_) => {
            tracing::warn!(%program, ?timeout, "install command timed out, killed");
            false
        }
    }
}

async fn bun_available() -> bool {
    tokio::process::Command::new("bun")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}
