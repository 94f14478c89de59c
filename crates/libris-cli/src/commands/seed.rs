//! Sample data command
//!
//! Usage: libris seed [--books <N>] [--authors <N>] [--config <PATH>]

use clap::Args;
use libris_core::ids::RandomIds;
use libris_engine::{apply_engine_command, EngineCommand, EngineCommandResult};
use libris_store::seed::SeedPlan;
use std::path::PathBuf;

use super::{migrated_executor, startup};

#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Number of books to generate
    #[arg(long, default_value_t = 1000)]
    pub books: usize,

    /// Number of authors to generate
    #[arg(long, default_value_t = 100)]
    pub authors: usize,

    /// Configuration file (defaults to ./libris.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute seed command
pub fn execute(args: SeedArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = startup(args.config.as_deref())?;
    let mut exec = migrated_executor(&config)?;

    let plan = SeedPlan {
        books: args.books,
        authors: args.authors,
        ..SeedPlan::default()
    };
    let result = apply_engine_command(
        EngineCommand::FillCatalog(plan),
        exec.as_mut(),
        &RandomIds,
        &config.engine_options(),
    )?;

    if let EngineCommandResult::CatalogFilled(report) = result {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
