//! libris CLI
//!
//! Command-line interface for the libris catalog

use clap::{Parser, Subcommand};
use libris_cli::commands;

#[derive(Debug, Parser)]
#[command(name = "libris")]
#[command(about = "libris - Book and author catalog service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve(commands::serve::ServeArgs),
    /// Apply pending schema migrations
    Migrate(commands::migrate::MigrateArgs),
    /// Insert generated sample data
    Seed(commands::seed::SeedArgs),
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::execute(args),
        Commands::Migrate(args) => commands::migrate::execute(args),
        Commands::Seed(args) => commands::seed::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
