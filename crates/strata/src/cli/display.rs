//! Common display utilities for CLI commands.

use colored::{ColoredString, Colorize};
use serde::Serialize;
use strata::{BusinessProcess, Result, RiskLevel};

const MAX_DISPLAY_ITEMS: usize = 10;

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Risk level coloured by severity.
pub fn risk(level: RiskLevel) -> ColoredString {
    match level {
        RiskLevel::Low => level.as_str().green(),
        RiskLevel::Medium => level.as_str().yellow(),
        RiskLevel::High => level.as_str().red(),
        RiskLevel::Critical => level.as_str().red().bold(),
    }
}

/// `Name [B] #12`
pub fn process_label(process: &BusinessProcess) -> String {
    format!(
        "{} {} {}",
        process.name,
        format!("[{}]", process.level).cyan(),
        format!("#{}", process.id).dimmed()
    )
}

/// Print a titled section of lines with truncation.
///
/// Shows up to `MAX_DISPLAY_ITEMS` lines with bullet points. If there are more,
/// shows "... and N more". If empty, shows "(none)".
pub fn print_section(title: &str, lines: &[String]) {
    println!(
        "  {} ({}):",
        title.white().bold(),
        lines.len().to_string().green()
    );
    if lines.is_empty() {
        println!("    {}", "(none)".dimmed());
        return;
    }

    for line in lines.iter().take(MAX_DISPLAY_ITEMS) {
        println!("    {} {line}", "•".dimmed());
    }

    if lines.len() > MAX_DISPLAY_ITEMS {
        println!(
            "    {} ... and {} more",
            "•".dimmed(),
            lines.len() - MAX_DISPLAY_ITEMS
        );
    }
}

/// Comma-separated ids for messages.
pub fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
