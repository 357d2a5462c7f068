//! Simulate and apply commands

use crate::commands::{print_json, WorkbookArgs};
use anyhow::Context;
use clap::Args;
use sheetx_core::{Batch, Outcome};
use sheetx_engine::{apply_engine_command, ApplyOptions, EngineCommand, EngineCommandResult};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Exit status when a batch was rejected or rolled back
const EXIT_UNCHANGED: u8 = 2;
/// Exit status when a restore failed and the workbook needs a manual check
const EXIT_INCONSISTENT: u8 = 3;

#[derive(Debug, Args)]
pub struct BatchArgs {
    #[command(flatten)]
    pub target: WorkbookArgs,

    /// Batch JSON file
    #[arg(long, short = 'b')]
    pub batch: PathBuf,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Do not keep the committed batch's snapshot for later rollback
    #[arg(long)]
    pub no_retain: bool,
}

pub fn execute_simulate(args: BatchArgs) -> anyhow::Result<ExitCode> {
    let batch = read_batch(&args.batch)?;
    let (mut session, mut vault, applier, _lock) = args.target.open()?;

    let result = apply_engine_command(EngineCommand::Simulate { batch }, &applier, &mut session, &mut vault)?;
    let EngineCommandResult::Simulated(review) = result else {
        anyhow::bail!("engine returned an unexpected result for simulate");
    };
    print_json(&review)?;
    Ok(if review.executable {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_UNCHANGED)
    })
}

pub fn execute_apply(args: ApplyArgs) -> anyhow::Result<ExitCode> {
    let batch = read_batch(&args.batch.batch)?;
    let (mut session, mut vault, applier, _lock) = args.batch.target.open()?;

    let cmd = EngineCommand::Apply {
        batch,
        options: ApplyOptions {
            retain_snapshot: !args.no_retain,
        },
    };
    let result = apply_engine_command(cmd, &applier, &mut session, &mut vault)?;
    let EngineCommandResult::Applied(review) = result else {
        anyhow::bail!("engine returned an unexpected result for apply");
    };
    print_json(&review)?;

    Ok(match review.outcome {
        Some(Outcome::Committed) => ExitCode::SUCCESS,
        Some(Outcome::PossiblyInconsistent) => {
            eprintln!("Restore failed: check the workbook by hand (see apply_result.applied_before_failure)");
            ExitCode::from(EXIT_INCONSISTENT)
        }
        _ => ExitCode::from(EXIT_UNCHANGED),
    })
}

fn read_batch(path: &Path) -> anyhow::Result<Batch> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading batch {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing batch {}", path.display()))
}
