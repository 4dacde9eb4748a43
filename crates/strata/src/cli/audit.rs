//! `strata audit` command implementation.

use colored::Colorize;
use strata::Result;

use super::Context;
use super::display::print_json;

/// Run the audit command.
pub fn run(ctx: &Context, json: bool) -> Result<()> {
    let mut strata = ctx.open()?;
    let audit = strata.hierarchy().audit()?;

    if json {
        return print_json(&audit);
    }

    println!(
        "Audited {} processes and {} relationships.",
        audit.process_count.to_string().cyan(),
        audit.relationship_count.to_string().cyan()
    );

    if audit.is_consistent() {
        println!("{}", "Hierarchy is consistent.".green());
        return Ok(());
    }

    if !audit.cycles.is_empty() {
        println!();
        println!(
            "Found {} cycles:",
            audit.cycles.len().to_string().red().bold()
        );
        for (i, cycle) in audit.cycles.iter().enumerate() {
            let path = cycle
                .iter()
                .map(|id| format!("#{id}"))
                .collect::<Vec<_>>()
                .join(" → ");
            println!("  {} {}: {}", "Cycle".yellow().bold(), i + 1, path.dimmed());
        }
    }

    if !audit.level_mismatches.is_empty() {
        println!();
        println!(
            "Found {} level mismatches:",
            audit.level_mismatches.len().to_string().red().bold()
        );
        for m in &audit.level_mismatches {
            let expected = m
                .expected
                .map_or_else(|| "no children".to_string(), |level| format!("level {level}"));
            println!(
                "  {} #{} [{}] → #{} [{}], expected {}",
                "•".dimmed(),
                m.parent,
                m.parent_level,
                m.child,
                m.child_level,
                expected.yellow()
            );
        }
    }
    Ok(())
}
