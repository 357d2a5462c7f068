//! Retained-snapshot rollback and purge

use crate::commands::{print_json, WorkbookArgs};
use clap::Args;
use sheetx_core_types::BatchId;
use sheetx_engine::{apply_engine_command, EngineCommand};
use std::process::ExitCode;

#[derive(Debug, Args)]
pub struct RollbackArgs {
    #[command(flatten)]
    pub target: WorkbookArgs,

    /// Batch id from the apply payload
    #[arg(long)]
    pub batch_id: String,
}

#[derive(Debug, Args)]
pub struct PurgeArgs {
    #[command(flatten)]
    pub target: WorkbookArgs,
}

pub fn execute(args: RollbackArgs) -> anyhow::Result<ExitCode> {
    let (mut session, mut vault, applier, _lock) = args.target.open()?;
    let cmd = EngineCommand::RollbackRetained {
        batch_id: BatchId::from_string(args.batch_id),
    };
    let result = apply_engine_command(cmd, &applier, &mut session, &mut vault)?;
    print_json(&result)?;
    Ok(ExitCode::SUCCESS)
}

pub fn execute_purge(args: PurgeArgs) -> anyhow::Result<ExitCode> {
    let (mut session, mut vault, applier, _lock) = args.target.open()?;
    let result = apply_engine_command(EngineCommand::PurgeExpired, &applier, &mut session, &mut vault)?;
    print_json(&result)?;
    Ok(ExitCode::SUCCESS)
}
