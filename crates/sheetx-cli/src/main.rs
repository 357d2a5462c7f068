//! SheetX CLI
//!
//! Transactional batch edits over file-backed workbooks

use clap::{Parser, Subcommand};
use sheetx_core::logging_facility::{self, Profile};
use std::process::ExitCode;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "sheetx")]
#[command(about = "SheetX - validated, all-or-nothing spreadsheet batches", long_about = None)]
struct Cli {
    /// Logging profile: dev, prod (JSON) or test (silent)
    #[arg(long, global = true, default_value = "prod")]
    log_profile: Profile,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a new workbook file
    Init(commands::init::InitArgs),
    /// Validate a batch without writing
    Simulate(commands::batch::BatchArgs),
    /// Apply a batch all-or-nothing
    Apply(commands::batch::ApplyArgs),
    /// Restore the snapshot retained for a committed batch
    Rollback(commands::rollback::RollbackArgs),
    /// Print the workbook or one sheet as JSON
    Show(commands::show::ShowArgs),
    /// Drop retained snapshots past their window
    Purge(commands::rollback::PurgeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging_facility::init(cli.log_profile);

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args),
        Commands::Simulate(args) => commands::batch::execute_simulate(args),
        Commands::Apply(args) => commands::batch::execute_apply(args),
        Commands::Rollback(args) => commands::rollback::execute(args),
        Commands::Show(args) => commands::show::execute(args),
        Commands::Purge(args) => commands::rollback::execute_purge(args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
