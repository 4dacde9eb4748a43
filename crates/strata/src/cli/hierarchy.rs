//! `strata move`, `duplicate`, `resequence` and `delete` command implementations.

use colored::Colorize;
use serde_json::json;
use strata::{Error, ProcessId, Result};

use super::Context;
use super::display::{print_json, print_section, process_label};

/// Run the move command.
pub fn run_move(ctx: &Context, id: i64, parent: Option<i64>, position: Option<usize>) -> Result<()> {
    let mut strata = ctx.open()?;
    let moved = strata
        .hierarchy()
        .move_process(ProcessId(id), parent.map(ProcessId), position)?;

    match parent {
        Some(parent) => println!(
            "{} {} under #{parent}",
            "Moved".green(),
            process_label(&moved)
        ),
        None => println!("{} {} to the top level", "Moved".green(), process_label(&moved)),
    }
    Ok(())
}

/// Run the duplicate command.
pub fn run_duplicate(ctx: &Context, id: i64) -> Result<()> {
    let mut strata = ctx.open()?;
    let mut hierarchy = strata.hierarchy();
    let copy = hierarchy.duplicate(ProcessId(id))?;
    let children: Vec<String> = hierarchy
        .children(copy.id)?
        .iter()
        .map(|c| process_label(&c.process))
        .collect();

    println!("{} {}", "Created".green(), process_label(&copy));
    print_section("Children", &children);
    Ok(())
}

/// Run the resequence command.
pub fn run_resequence(ctx: &Context, parent: i64) -> Result<()> {
    let mut strata = ctx.open()?;
    let children = strata.hierarchy().resequence_children(ProcessId(parent))?;
    let lines: Vec<String> = children
        .iter()
        .map(|c| format!("{} {}", c.sequence_number, process_label(&c.process)))
        .collect();

    println!("{} children of #{parent}", "Resequenced".green());
    print_section("Children", &lines);
    Ok(())
}

/// Run the delete command.
///
/// Without `--yes` only the preview is shown.
pub fn run_delete(ctx: &Context, id: i64, yes: bool, json: bool) -> Result<()> {
    let mut strata = ctx.open()?;
    let mut hierarchy = strata.hierarchy();
    let id = ProcessId(id);
    let preview = hierarchy.preview_deletion(id)?;

    if !preview.can_delete {
        if json {
            return print_json(&json!({ "preview": preview, "deleted": false }));
        }
        return Err(Error::process_not_found(id));
    }

    let deleted = yes && hierarchy.delete(id)?;

    if json {
        return print_json(&json!({ "preview": preview, "deleted": deleted }));
    }

    println!("{}", preview.message);
    if deleted {
        println!(
            "{} {} process(es)",
            "Deleted".red().bold(),
            preview.orphaned_children.len() + 1
        );
    } else {
        println!("{}", "Re-run with --yes to delete.".dimmed());
    }
    Ok(())
}
