//! `ccsync install`: first-time provisioning of the whole bundle.
//!
//! Same machinery as sync, but applies every new and modified item without
//! selection, adopts the remote status line, and installs script
//! dependencies. Deletions are never applied on install.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::apply;
use crate::backup::BackupManager;
use crate::classify::{self, ItemStatus, SyncItem};
use crate::config;
use crate::deps;
use crate::github::{RemoteClient, RemoteSource};
use crate::platform::Platform;
use crate::transform::Transformer;

use super::{confirm, spinner, Decision};

pub async fn run(source: RemoteSource, folder: Option<PathBuf>, yes: bool) -> Result<()> {
    let target_dir = config::resolve_target_dir(folder)?;
    let platform = Platform::detect();
    let transformer = Transformer::new(&platform, &target_dir);
    let client = RemoteClient::new(source)?;

    println!(
        "{} {}",
        "Installing configuration bundle into".bold(),
        target_dir.display().to_string().cyan()
    );

    let bar = spinner("Fetching remote bundle listing...");
    let analysis = classify::analyze(&client, &transformer, &target_dir).await?;
    bar.finish_and_clear();

    let to_install: Vec<SyncItem> = analysis
        .items
        .iter()
        .filter(|i| matches!(i.status, ItemStatus::New | ItemStatus::Modified))
        .cloned()
        .collect();

    if to_install.is_empty() && analysis.hooks.is_empty() {
        println!("{}", "Already fully installed.".green());
        return Ok(());
    }

    println!(
        "Will install {} file(s) and {} hook(s).",
        to_install.len(),
        analysis.hooks.len()
    );
    if confirm("Proceed?", yes)? == Decision::Cancelled {
        println!("{}", "Install cancelled.".yellow());
        return Ok(());
    }

    let manager = BackupManager::new(BackupManager::default_root()?);
    if let Some(path) = manager.create(&target_dir)? {
        println!(
            "Existing config backed up to {}",
            path.display().to_string().dimmed()
        );
    }

    let bar = spinner("Installing...");
    let mut stats =
        apply::apply_items(&client, &transformer, &target_dir, &to_install, |path, action| {
            bar.set_message(format!("{}: {}", action.as_str(), path));
        })
        .await?;
    stats.merge(apply::apply_hooks(&target_dir, &analysis.hooks, |hook, action| {
        bar.set_message(format!("{}: settings.json {}", action.as_str(), hook));
    })?);

    if let Some(remote_settings) = client.fetch_settings().await? {
        if apply::adopt_status_line(&target_dir, &remote_settings, &transformer)? {
            bar.set_message("adopted status line");
        }
    }
    bar.finish_and_clear();

    let deps_bar = spinner("Installing script dependencies...");
    deps::install_script_deps(&target_dir).await?;
    deps_bar.finish_and_clear();

    if stats.failed > 0 {
        println!(
            "{}",
            format!(
                "Installed {} item(s), {} failed.",
                stats.success, stats.failed
            )
            .yellow()
        );
    } else {
        println!(
            "{}",
            format!("Installed {} item(s).", stats.success).green()
        );
    }
    Ok(())
}
