//! `ccsync backup`: create, list, and restore snapshots.

use anyhow::{bail, Result};
use chrono::Local;
use colored::Colorize;
use std::path::PathBuf;

use crate::backup::{BackupInfo, BackupManager};
use crate::config;

use super::{confirm, spinner, Decision};

pub fn create(folder: Option<PathBuf>) -> Result<()> {
    let target_dir = config::resolve_target_dir(folder)?;
    let manager = BackupManager::new(BackupManager::default_root()?);
    match manager.create(&target_dir)? {
        Some(path) => println!(
            "{} {}",
            "Backup created:".green(),
            path.display().to_string().dimmed()
        ),
        None => println!("{}", "Nothing to back up.".yellow()),
    }
    Ok(())
}

pub fn list() -> Result<()> {
    let manager = BackupManager::new(BackupManager::default_root()?);
    let backups = manager.list()?;
    if backups.is_empty() {
        println!(
            "No backups found in {}",
            manager.root().display().to_string().dimmed()
        );
        return Ok(());
    }
    for backup in backups {
        println!("{}  {}", backup.name.cyan(), relative_age(&backup).dimmed());
    }
    Ok(())
}

pub fn restore(name: String, folder: Option<PathBuf>, yes: bool) -> Result<()> {
    let target_dir = config::resolve_target_dir(folder)?;
    let manager = BackupManager::new(BackupManager::default_root()?);
    let Some(backup) = manager.find(&name)? else {
        bail!("no backup named '{name}' (see `ccsync backup list`)");
    };

    println!(
        "Restoring {} ({}) into {}",
        backup.name.cyan(),
        relative_age(&backup),
        target_dir.display().to_string().cyan()
    );
    let prompt = "This will overwrite your current configuration. Continue?";
    if confirm(prompt, yes)? == Decision::Cancelled {
        println!("{}", "Restore cancelled.".yellow());
        return Ok(());
    }

    // Snapshot current state first so the restore itself can be rolled back.
    let bar = spinner("Backing up current configuration...");
    match manager.create(&target_dir)? {
        Some(path) => bar.finish_with_message(format!(
            "Current config backed up to {}",
            path.display().to_string().dimmed()
        )),
        None => bar.finish_with_message("No current config to back up"),
    }

    let bar = spinner("Restoring...");
    manager.restore(&backup.path, &target_dir)?;
    bar.finish_and_clear();
    println!("{}", format!("Restored configuration from {}", backup.name).green());
    Ok(())
}

fn relative_age(backup: &BackupInfo) -> String {
    let age = Local::now().naive_local() - backup.timestamp;
    if age.num_minutes() < 60 {
        let n = age.num_minutes().max(0);
        format!("{n} minute{} ago", plural(n))
    } else if age.num_hours() < 24 {
        let n = age.num_hours();
        format!("{n} hour{} ago", plural(n))
    } else {
        let n = age.num_days();
        format!("{n} day{} ago", plural(n))
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
