//! Engine-level commands over one workbook session and vault.

use crate::commands::batch::{apply_batch, simulate_batch, ApplyOptions};
use crate::commands::review::ReviewPayload;
use serde::{Deserialize, Serialize};
use sheetx_core::{log_op_end, log_op_error, log_op_start};
use sheetx_core::{Batch, SnapshotVault, TransactionalApplier, WorkbookSession};
use sheetx_core_types::{BatchId, WorkbookId};
use sheetx_store::errors::Result;
use std::time::Instant;

/// Engine-level commands that touch the workbook or the vault.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Validate and cross-check without writing.
    Simulate { batch: Batch },
    /// Run the transactional apply.
    Apply { batch: Batch, options: ApplyOptions },
    /// Restore the snapshot retained for a committed batch.
    RollbackRetained { batch_id: BatchId },
    /// Drop retained snapshots past their window.
    PurgeExpired,
}

impl EngineCommand {
    pub fn name(&self) -> &'static str {
        match self {
            EngineCommand::Simulate { .. } => "simulate",
            EngineCommand::Apply { .. } => "apply",
            EngineCommand::RollbackRetained { .. } => "rollback_retained",
            EngineCommand::PurgeExpired => "purge_expired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackResult {
    pub workbook_id: WorkbookId,
    pub batch_id: BatchId,
    /// Sheets written back; sheets the batch had created are removed
    pub restored_sheets: Vec<String>,
    pub removed_sheets: Vec<String>,
}

/// Result of applying an engine command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum EngineCommandResult {
    Simulated(ReviewPayload),
    Applied(ReviewPayload),
    RolledBack(RollbackResult),
    Purged { count: usize },
}

/// Apply an engine command.
///
/// # Errors
///
/// Returns the command's failure as an `ExError`; batch-level outcomes
/// (rejection, rollback, restore failure) are reported in the payload
/// instead.
pub fn apply_engine_command(
    cmd: EngineCommand,
    applier: &TransactionalApplier,
    session: &mut dyn WorkbookSession,
    vault: &mut dyn SnapshotVault,
) -> Result<EngineCommandResult> {
    let started = Instant::now();
    let op = cmd.name();
    let workbook_id = session.workbook_id();
    log_op_start!(op, workbook_id = %workbook_id);

    let result = match cmd {
        EngineCommand::Simulate { batch } => {
            simulate_batch(&batch, applier, &*session).map(EngineCommandResult::Simulated)
        }
        EngineCommand::Apply { batch, options } => {
            apply_batch(&batch, options, applier, session, vault).map(EngineCommandResult::Applied)
        }
        EngineCommand::RollbackRetained { batch_id } => applier
            .rollback_retained(&batch_id, session, vault)
            .map(|snapshot| {
                let (restored, removed): (Vec<_>, Vec<_>) =
                    snapshot.sheets.iter().partition(|(_, sheet)| sheet.is_some());
                EngineCommandResult::RolledBack(RollbackResult {
                    workbook_id: snapshot.workbook_id.clone(),
                    batch_id: snapshot.batch_id.clone(),
                    restored_sheets: restored.into_iter().map(|(name, _)| name.clone()).collect(),
                    removed_sheets: removed.into_iter().map(|(name, _)| name.clone()).collect(),
                })
            })
            .map_err(Into::into),
        EngineCommand::PurgeExpired => vault
            .purge_expired(chrono::Utc::now())
            .map(|count| EngineCommandResult::Purged { count })
            .map_err(Into::into),
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => {
            log_op_end!(op, duration_ms = duration_ms);
        }
        Err(err) => log_op_error!(op, err.clone(), duration_ms = duration_ms),
    }
    result
}
