//! Schema bootstrap command
//!
//! Usage: libris migrate [--config <PATH>]

use clap::Args;
use libris_store::migrations::applied_migrations;
use std::path::PathBuf;

use super::{migrated_executor, startup};

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Configuration file (defaults to ./libris.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute migrate command
pub fn execute(args: MigrateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = startup(args.config.as_deref())?;
    let mut exec = migrated_executor(&config)?;

    let applied = applied_migrations(exec.as_mut())?;
    println!(
        "Schema up to date on {} ({} migration(s))",
        config.database.dialect,
        applied.len()
    );
    for id in applied {
        println!("  {}", id);
    }
    Ok(())
}
