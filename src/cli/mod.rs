//! Terminal-facing helpers: run summaries, task listing, confirmations.

pub mod report;

use console::style;
use dialoguer::Confirm;

/// Ask for confirmation (returns true if --yes flag or user confirms).
pub fn confirm(message: &str, non_interactive: bool) -> bool {
    if non_interactive {
        return true;
    }
    Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()
        .unwrap_or(false)
}

/// Print a styled error line.
pub fn print_error(message: &str) {
    eprintln!("  {} {}", style("✗").red().bold(), message);
}
