//! `strata init` command implementation.

use colored::Colorize;
use strata::{Result, Strata};

use super::Context;

/// Create the database (and schema) plus a default configuration file.
///
/// An existing configuration file is left untouched.
pub fn run(ctx: &Context) -> Result<()> {
    let existed = ctx.config.database.exists();
    let strata = Strata::open(ctx.config.clone())?;

    if ctx.config_path.exists() {
        println!(
            "{} {}",
            "Using".dimmed(),
            ctx.config_path.display().to_string().white().bold()
        );
    } else {
        strata.config().save(&ctx.config_path)?;
        println!(
            "{} {}",
            "Created".green(),
            ctx.config_path.display().to_string().white().bold()
        );
    }

    let verb = if existed { "Opened".dimmed() } else { "Created".green() };
    println!(
        "{verb} {}",
        ctx.config.database.display().to_string().white().bold()
    );
    Ok(())
}
