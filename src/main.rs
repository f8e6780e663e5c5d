use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ccsync::commands;
use ccsync::config;

#[derive(Parser)]
#[command(name = "ccsync", version, about = "Install and sync AI coding-assistant configuration bundles")]
struct Cli {
    /// Remote repository as owner/name.
    #[arg(long, global = true, env = "CCSYNC_REPO")]
    repo: Option<String>,

    #[arg(long, global = true, env = "CCSYNC_BRANCH")]
    branch: Option<String>,

    /// Path prefix inside the repository holding the bundle.
    #[arg(long = "base-path", global = true, env = "CCSYNC_BASE_PATH")]
    base_path: Option<String>,

    /// GitHub token for private repositories.
    #[arg(long, global = true, env = "CCSYNC_GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Diff the remote bundle against the target tree and apply updates.
    Sync {
        /// Target directory (default: auto-detected .claude tree).
        #[arg(long)]
        folder: Option<PathBuf>,
        /// Also delete local items that no longer exist upstream.
        #[arg(long)]
        delete: bool,
        /// Report changes without applying anything.
        #[arg(long)]
        dry_run: bool,
        /// Skip confirmation prompts.
        #[arg(short, long)]
        yes: bool,
    },
    /// First-time provisioning of the full bundle.
    Install {
        #[arg(long)]
        folder: Option<PathBuf>,
        #[arg(short, long)]
        yes: bool,
    },
    /// Manage snapshots of the target tree.
    Backup {
        #[command(subcommand)]
        action: BackupCommand,
    },
    /// Store a GitHub token for private-repository access.
    Activate { token: String },
}

#[derive(Subcommand)]
enum BackupCommand {
    Create {
        #[arg(long)]
        folder: Option<PathBuf>,
    },
    List,
    /// Restore a snapshot by name (see `backup list`).
    Restore {
        name: String,
        #[arg(long)]
        folder: Option<PathBuf>,
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let source = config::resolve_source(cli.repo, cli.branch, cli.base_path, cli.token)?;

    match cli.command {
        Command::Sync {
            folder,
            delete,
            dry_run,
            yes,
        } => {
            commands::sync::run(
                source,
                commands::sync::SyncOptions {
                    folder,
                    delete,
                    dry_run,
                    yes,
                },
            )
            .await
        }
        Command::Install { folder, yes } => commands::install::run(source, folder, yes).await,
        Command::Backup { action } => match action {
            BackupCommand::Create { folder } => commands::backup::create(folder),
            BackupCommand::List => commands::backup::list(),
            BackupCommand::Restore { name, folder, yes } => {
                commands::backup::restore(name, folder, yes)
            }
        },
        Command::Activate { token } => {
            let path = config::save_token(&token)?;
            println!("Token saved to {}", path.display());
            Ok(())
        }
    }
}
