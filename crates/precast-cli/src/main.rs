//! Precast CLI
//!
//! Operator commands for the BOM diff and inventory adjustment engine

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "precast")]
#[command(about = "Precast - BOM revision diffs and inventory adjustments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate(commands::migrate::MigrateArgs),
    /// Show element types whose BOM changed since production
    Diff(commands::diff::DiffArgs),
    /// Apply an inventory adjustment from a JSON request file
    Adjust(commands::adjust::AdjustArgs),
    /// List the adjustment ledger of a project
    Logs(commands::logs::LogsArgs),
    /// Replace an element type's BOM, freezing the old one as a revision
    ReviseBom(commands::bom::ReviseBomArgs),
    /// Clear an element type's adjustment latch
    ResetLatch(commands::bom::ResetLatchArgs),
    /// Run the HTTP server
    Serve(commands::serve::ServeArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate(args) => commands::migrate::execute(args),
        Commands::Diff(args) => commands::diff::execute(args),
        Commands::Adjust(args) => commands::adjust::execute(args),
        Commands::Logs(args) => commands::logs::execute(args),
        Commands::ReviseBom(args) => commands::bom::execute_revise(args),
        Commands::ResetLatch(args) => commands::bom::execute_reset(args),
        Commands::Serve(args) => commands::serve::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
