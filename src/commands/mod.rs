//! CLI workflows. Everything here is orchestration over the core modules;
//! errors bubble to `main` as `anyhow` and print without a stack trace.

pub mod backup;
pub mod install;
pub mod sync;

use std::io::{BufRead, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Outcome of an interactive confirmation point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Cancelled,
}

/// Plain y/N confirmation on stdin. `assume_yes` (from `--yes`) skips the
/// prompt. A "no" is a clean cancellation, not an error.
pub fn confirm(prompt: &str, assume_yes: bool) -> std::io::Result<Decision> {
    if assume_yes {
        return Ok(Decision::Proceed);
    }
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    if answer == "y" || answer == "yes" {
        Ok(Decision::Proceed)
    } else {
        Ok(Decision::Cancelled)
    }
}

pub fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("static template"),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}
