//! `strata tree` command implementation.

use colored::Colorize;
use strata::{Error, ProcessId, ProcessTree, Result};

use super::Context;
use super::display::{print_json, process_label};

/// Run the tree command.
pub fn run(ctx: &Context, id: Option<i64>, json: bool) -> Result<()> {
    let mut strata = ctx.open()?;
    let hierarchy = strata.hierarchy();

    let trees = match id {
        Some(id) => {
            let id = ProcessId(id);
            let tree = hierarchy
                .tree(id)?
                .ok_or_else(|| Error::process_not_found(id))?;
            vec![tree]
        }
        None => {
            let roots = hierarchy.roots()?;
            let mut trees = Vec::with_capacity(roots.len());
            for root in roots {
                if let Some(tree) = hierarchy.tree(root.id)? {
                    trees.push(tree);
                }
            }
            trees
        }
    };

    if json {
        return print_json(&trees);
    }

    if trees.is_empty() {
        println!("{}", "No business processes.".dimmed());
        return Ok(());
    }
    for tree in &trees {
        print_tree(tree, 0);
    }
    let total: usize = trees.iter().map(ProcessTree::len).sum();
    println!();
    println!("{} processes", total.to_string().green());
    Ok(())
}

fn print_tree(tree: &ProcessTree, depth: usize) {
    let indent = "  ".repeat(depth);
    let seq = tree
        .sequence_number
        .map_or_else(String::new, |s| format!(" {}", format!("({s})").dimmed()));
    println!("{indent}{} {}{seq}", "•".dimmed(), process_label(&tree.process));
    for child in &tree.children {
        print_tree(child, depth + 1);
    }
}
