//! `ccsync sync`: analyze the remote bundle against the target tree,
//! report, and apply the approved subset.

use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::apply::{self, ApplyStats};
use crate::backup::BackupManager;
use crate::classify::{self, Category, HookStatus, ItemStatus, SyncAnalysis, SyncItem};
use crate::config;
use crate::deps;
use crate::github::{RemoteClient, RemoteSource};
use crate::platform::Platform;
use crate::transform::Transformer;

use super::{confirm, spinner, Decision};

pub struct SyncOptions {
    pub folder: Option<PathBuf>,
    /// Also apply deletions. Off by default: removing local files needs an
    /// explicit opt-in.
    pub delete: bool,
    pub dry_run: bool,
    pub yes: bool,
}

pub async fn run(source: RemoteSource, options: SyncOptions) -> Result<()> {
    let target_dir = config::resolve_target_dir(options.folder)?;
    let platform = Platform::detect();
    let transformer = Transformer::new(&platform, &target_dir);
    let client = RemoteClient::new(source)?;

    println!(
        "{} {}",
        "Syncing".bold(),
        target_dir.display().to_string().cyan()
    );

    let bar = spinner("Analyzing changes...");
    let analysis = classify::analyze(&client, &transformer, &target_dir).await?;
    bar.finish_and_clear();

    if analysis.is_clean() {
        println!("{}", "Everything is up to date.".green());
        return Ok(());
    }

    print_report(&analysis);

    let mut selected: Vec<SyncItem> = analysis
        .items
        .iter()
        .filter(|i| matches!(i.status, ItemStatus::New | ItemStatus::Modified))
        .cloned()
        .collect();
    let deletions: Vec<SyncItem> = analysis
        .items
        .iter()
        .filter(|i| i.status == ItemStatus::Deleted)
        .cloned()
        .collect();
    if options.delete {
        selected.extend(deletions.iter().cloned());
    } else if !deletions.is_empty() {
        println!(
            "{}",
            format!(
                "  {} local item(s) no longer exist upstream (re-run with --delete to remove)",
                deletions.len()
            )
            .dimmed()
        );
    }

    if options.dry_run {
        println!("{}", "Dry run, nothing applied.".yellow());
        return Ok(());
    }

    if selected.is_empty() && analysis.hooks.is_empty() {
        println!("{}", "Nothing selected to sync.".yellow());
        return Ok(());
    }

    print_plan(&selected, analysis.hooks.len());
    if confirm("Proceed with sync?", options.yes)? == Decision::Cancelled {
        println!("{}", "Sync cancelled.".yellow());
        return Ok(());
    }

    let manager = BackupManager::new(BackupManager::default_root()?);
    let bar = spinner("Creating backup...");
    match manager.create(&target_dir)? {
        Some(path) => bar.finish_with_message(format!(
            "Backup created: {}",
            path.display().to_string().dimmed()
        )),
        None => bar.finish_with_message("No existing config to back up"),
    }

    let bar = spinner("Syncing...");
    let mut stats = apply::apply_items(&client, &transformer, &target_dir, &selected, |path, action| {
        bar.set_message(format!("{}: {}", action.as_str(), path));
    })
    .await?;
    stats.merge(apply::apply_hooks(&target_dir, &analysis.hooks, |hook, action| {
        bar.set_message(format!("{}: settings.json {}", action.as_str(), hook));
    })?);
    bar.finish_and_clear();

    print_tally(&stats);

    if selected.iter().any(|i| {
        i.category == Category::Scripts && matches!(i.status, ItemStatus::New | ItemStatus::Modified)
    }) {
        let bar = spinner("Installing script dependencies...");
        let installed = deps::install_script_deps(&target_dir).await?;
        bar.finish_and_clear();
        if installed {
            println!("{}", "Script dependencies installed.".green());
        }
    }

    if stats.failed > 0 {
        println!("{}", "Sync finished with failures.".yellow());
    } else {
        println!("{}", "Sync completed.".green());
    }
    Ok(())
}

fn status_marker(status: ItemStatus) -> colored::ColoredString {
    match status {
        ItemStatus::New => "+".green(),
        ItemStatus::Modified => "~".yellow(),
        ItemStatus::Deleted => "-".red(),
        ItemStatus::Unchanged => "=".dimmed(),
    }
}

fn print_report(analysis: &SyncAnalysis) {
    println!(
        "Found: {}, {}, {}, {}",
        format!("{} new", analysis.new_count()).green(),
        format!("{} modified", analysis.modified_count()).yellow(),
        format!("{} to remove", analysis.deleted_count()).red(),
        format!("{} unchanged", analysis.unchanged_count()).dimmed(),
    );

    let changed = analysis.changed_items();
    for category in Category::ALL {
        let items: Vec<&&SyncItem> = changed
            .iter()
            .filter(|i| i.category == category)
            .collect();
        if items.is_empty() {
            continue;
        }
        println!("\n  {}", category.dir_name().to_uppercase().cyan().bold());
        if category.grouped_by_folder() {
            for (folder, tally) in folder_tallies(&items) {
                println!("    {} {}", folder, tally.dimmed());
            }
        } else {
            for item in items {
                println!(
                    "    {} {}",
                    status_marker(item.status),
                    item.relative_path
                );
            }
        }
    }

    if !analysis.hooks.is_empty() {
        println!("\n  {}", "SETTINGS (hooks)".cyan().bold());
        for hook in &analysis.hooks {
            let label = format!(
                "{}[{}]",
                hook.hook_type,
                apply::display_matcher(&hook.matcher)
            );
            match hook.status {
                HookStatus::New => println!("    {} {}", "+".green(), label.green()),
                HookStatus::Modified => println!("    {} {}", "~".yellow(), label.yellow()),
            }
        }
    }
    println!();
}

/// Per-top-level-folder `+n ~n -n` summaries for the grouped categories.
fn folder_tallies(items: &[&&SyncItem]) -> BTreeMap<String, String> {
    let mut counts: BTreeMap<String, (usize, usize, usize)> = BTreeMap::new();
    for item in items {
        let top = item.name.split('/').next().unwrap_or_default().to_string();
        let entry = counts.entry(top).or_default();
        match item.status {
            ItemStatus::New => entry.0 += 1,
            ItemStatus::Modified => entry.1 += 1,
            ItemStatus::Deleted => entry.2 += 1,
            ItemStatus::Unchanged => {}
        }
    }
    counts
        .into_iter()
        .map(|(folder, (new, modified, deleted))| {
            let mut parts = Vec::new();
            if new > 0 {
                parts.push(format!("+{new}"));
            }
            if modified > 0 {
                parts.push(format!("~{modified}"));
            }
            if deleted > 0 {
                parts.push(format!("-{deleted}"));
            }
            (folder, format!("({})", parts.join(", ")))
        })
        .collect()
}

fn print_plan(selected: &[SyncItem], hook_count: usize) {
    let to_add = selected.iter().filter(|i| i.status == ItemStatus::New).count();
    let to_update = selected
        .iter()
        .filter(|i| i.status == ItemStatus::Modified)
        .count();
    let to_remove = selected
        .iter()
        .filter(|i| i.status == ItemStatus::Deleted)
        .count();

    println!("{}", "What will happen:".bold());
    if to_add > 0 {
        println!("{}", format!("  add {to_add} file(s)").green());
    }
    if to_update > 0 {
        println!("{}", format!("  update {to_update} file(s)").yellow());
    }
    if to_remove > 0 {
        println!("{}", format!("  delete {to_remove} file(s)").red());
    }
    if hook_count > 0 {
        println!("{}", format!("  merge {hook_count} hook(s) into settings.json").cyan());
    }
}

fn print_tally(stats: &ApplyStats) {
    let mut parts = Vec::new();
    parts.push(format!("{} added/updated", stats.success).green().to_string());
    if stats.deleted > 0 {
        parts.push(format!("{} removed", stats.deleted).red().to_string());
    }
    if stats.failed > 0 {
        parts.push(format!("{} failed", stats.failed).yellow().to_string());
    }
    println!("{}", parts.join(", "));
}
