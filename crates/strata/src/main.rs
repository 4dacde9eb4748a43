//! Strata CLI - process hierarchy and impact analysis from the command line.
//!
//! Strata keeps an A/B/C business-process hierarchy in `SQLite` and reports
//! what is affected when applications, interfaces or change requests change.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli;

/// Strata: process hierarchy and impact propagation.
#[derive(Parser)]
#[command(name = "strata")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Database path (overrides the configuration file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Configuration file (defaults to .strata/strata.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and a default configuration file
    Init,

    /// Analyze what a change would affect
    Impact {
        #[command(subcommand)]
        target: ImpactTarget,

        /// Print the report as JSON
        #[arg(long, global = true)]
        json: bool,
    },

    /// Show the process hierarchy (all roots when no id is given)
    Tree {
        /// Root process id
        id: Option<i64>,

        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move a process under a new parent, or to the top level
    Move {
        /// Process to move
        id: i64,

        /// New parent (omit to make the process a root)
        #[arg(short, long)]
        parent: Option<i64>,

        /// Position among the new siblings, starting at 0 (omit to append)
        #[arg(long)]
        position: Option<usize>,
    },

    /// Duplicate a process next to the original
    Duplicate {
        /// Process to duplicate
        id: i64,
    },

    /// Renumber a parent's children to 10, 20, 30, ...
    Resequence {
        /// Parent process id
        parent: i64,
    },

    /// Show what deleting a process would remove, then delete with --yes
    Delete {
        /// Process to delete
        id: i64,

        /// Delete without stopping at the preview
        #[arg(short, long)]
        yes: bool,

        /// Print the preview (and outcome) as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the hierarchy for cycles and level mismatches
    Audit {
        /// Print the audit as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ImpactTarget {
    /// Impact of changing one or more applications
    App {
        /// Application ids
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },

    /// Impact declared by one or more change requests
    Cr {
        /// Change request ids
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },

    /// Impact of changing one or more interfaces
    Interface {
        /// Interface ids
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let result = cli::Context::load(cli.config, cli.db).and_then(|ctx| match cli.command {
        Commands::Init => cli::init::run(&ctx),
        Commands::Impact { target, json } => match target {
            ImpactTarget::App { ids } => cli::impact::run_applications(&ctx, &ids, json),
            ImpactTarget::Cr { ids } => cli::impact::run_change_requests(&ctx, &ids, json),
            ImpactTarget::Interface { ids } => cli::impact::run_interfaces(&ctx, &ids, json),
        },
        Commands::Tree { id, json } => cli::tree::run(&ctx, id, json),
        Commands::Move {
            id,
            parent,
            position,
        } => cli::hierarchy::run_move(&ctx, id, parent, position),
        Commands::Duplicate { id } => cli::hierarchy::run_duplicate(&ctx, id),
        Commands::Resequence { parent } => cli::hierarchy::run_resequence(&ctx, parent),
        Commands::Delete { id, yes, json } => cli::hierarchy::run_delete(&ctx, id, yes, json),
        Commands::Audit { json } => cli::audit::run(&ctx, json),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  {}: {cause}", "caused by".dimmed());
                source = std::error::Error::source(cause);
            }
            ExitCode::FAILURE
        }
    }
}
