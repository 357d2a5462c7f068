//! Transactional batch applier
//!
//! ## Atomicity Contract
//!
//! - **Validate everything first**: every operation is checked and all
//!   defects are reported before anything is written.
//! - **Snapshot before mutation**: the touched sheets and the named-range
//!   table are captured before the first executor runs. A failed capture
//!   aborts with nothing written.
//! - **Whole-snapshot rollback**: the first executor failure restores the
//!   snapshot. There are no per-operation inverses.
//! - **Strict order**: executors run one at a time in sequence-index order.
//!
//! Only a failed restore leaves the workbook possibly inconsistent, and the
//! report then lists exactly which operations had been applied.
//!
//! A committed batch may retain its snapshot together with per-sheet
//! digests of the state it committed. `rollback_retained` refuses once a
//! later edit has moved a touched sheet past that state, and keeps the
//! snapshot until the restore has succeeded.
//!
//! ## Example
//!
//! ```
//! use sheetx_core::{ApplierConfig, Batch, CellInput, Operation, TransactionalApplier, Workbook};
//! use sheetx_core::session::InMemorySession;
//!
//! let applier = TransactionalApplier::new(ApplierConfig::default()).unwrap();
//! let mut session = InMemorySession::new(Workbook::new("book", "Sheet1"));
//! let batch = Batch::from_operations([Operation::CellWrite {
//!     sheet: "Sheet1".to_string(),
//!     cell: "A1".to_string(),
//!     value: CellInput::Text("Revenue".to_string()),
//! }]);
//!
//! let report = applier.apply(&batch, &mut session, None).unwrap();
//! assert!(report.apply_result.committed);
//! ```

use crate::config::ApplierConfig;
use crate::errors::{Result, SheetXError};
use crate::executors::{execute, ExecContext};
use crate::guard::BatchGuard;
use crate::io::bounded;
use crate::model::{Batch, ChangeRecord, SequencedOperation, WorkbookSchema};
use crate::reference::{ReferenceCheck, ReferenceMatcher};
use crate::report::{
    summarize_errors, ApplyReport, ApplyResult, BatchFault, OperationOutcome, PlannedOperation,
    SimulationReport, ValidationResult,
};
use crate::rules::OperationValidator;
use crate::session::WorkbookSession;
use crate::snapshot::{CommittedState, RetainedSnapshot, Snapshot, SnapshotManager, SnapshotVault};
use crate::state::{BatchState, BatchStateMachine};
use crate::{log_op_end, log_op_error, log_op_start};
use chrono::Utc;
use sheetx_core_types::{BatchId, WorkbookId};
use std::collections::BTreeSet;
use std::time::Instant;

/// Validates, snapshots, applies and if needed rolls back one batch
#[derive(Debug, Clone)]
pub struct TransactionalApplier {
    config: ApplierConfig,
    validator: OperationValidator,
    matcher: ReferenceMatcher,
    snapshots: SnapshotManager,
    guard: BatchGuard,
}

impl TransactionalApplier {
    /// # Errors
    ///
    /// Returns `SheetXError::Config` if the configuration is invalid.
    pub fn new(config: ApplierConfig) -> Result<Self> {
        Self::with_guard(config, BatchGuard::new())
    }

    /// Applier sharing an existing guard, so several appliers still admit
    /// one batch per workbook between them
    ///
    /// # Errors
    ///
    /// Returns `SheetXError::Config` if the configuration is invalid.
    pub fn with_guard(config: ApplierConfig, guard: BatchGuard) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            validator: OperationValidator::new(&config),
            matcher: ReferenceMatcher::new(&config.reference),
            snapshots: SnapshotManager::new(&config),
            guard,
            config,
        })
    }

    pub fn config(&self) -> &ApplierConfig {
        &self.config
    }

    pub fn guard(&self) -> &BatchGuard {
        &self.guard
    }

    /// Validate every operation against the session's current schema
    ///
    /// # Errors
    ///
    /// Returns `SheetXError::SnapshotCapture` if the schema cannot be read.
    pub fn validate(&self, batch: &Batch, session: &dyn WorkbookSession) -> Result<Vec<ValidationResult>> {
        let schema = self.read_schema(session)?;
        Ok(self.validator.validate_batch(&batch.ordered(), &schema))
    }

    /// Validate and cross-check without writing anything
    ///
    /// # Errors
    ///
    /// Returns `BatchInProgress` if another batch holds the workbook, or
    /// `SnapshotCapture` if the schema cannot be read.
    pub fn simulate(&self, batch: &Batch, session: &dyn WorkbookSession) -> Result<SimulationReport> {
        let started = Instant::now();
        let workbook_id = session.workbook_id();
        let batch_id = BatchId::new();
        log_op_start!(
            "simulate",
            workbook_id = %workbook_id,
            batch_id = %batch_id,
            op_count = batch.len()
        );

        let _lease = self.guard.try_acquire(&workbook_id)?;
        let mut machine = BatchStateMachine::new();
        machine.transition(BatchState::Validating)?;

        let ordered = batch.ordered();
        let validations = match self.read_schema(session) {
            Ok(schema) => self.validator.validate_batch(&ordered, &schema),
            Err(err) => {
                log_op_error!("simulate", err.clone(), duration_ms = elapsed_ms(started));
                return Err(err);
            }
        };
        let executable = validations.iter().all(|v| v.valid);
        if !executable {
            machine.transition(BatchState::Rejected)?;
        }

        let would_apply = if executable {
            ordered
                .iter()
                .map(|op| PlannedOperation {
                    index: op.index,
                    kind: op.operation.kind_name().to_string(),
                    description: op.operation.describe(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let report = SimulationReport {
            error_summary: summarize_errors(&validations, &[], None),
            reference_checks: self.reference_checks(batch, &ordered),
            batch_id,
            workbook_id,
            state: machine.state(),
            executable,
            validations,
            would_apply,
        };
        log_op_end!(
            "simulate",
            duration_ms = elapsed_ms(started),
            executable = report.executable
        );
        Ok(report)
    }

    /// Run the full validate, snapshot, apply, commit-or-rollback cycle
    ///
    /// Validation defects, capture failures, executor failures and restore
    /// failures are all reported in the returned `ApplyReport`. When a vault
    /// is given, a committed batch's snapshot is retained there for the
    /// configured window.
    ///
    /// # Errors
    ///
    /// Returns `BatchInProgress` if another batch holds the workbook,
    /// `SnapshotCapture` if the schema cannot be read, or
    /// `IllegalTransition` on an internal state machine fault.
    pub fn apply(
        &self,
        batch: &Batch,
        session: &mut dyn WorkbookSession,
        vault: Option<&mut dyn SnapshotVault>,
    ) -> Result<ApplyReport> {
        let started = Instant::now();
        let workbook_id = session.workbook_id();
        let batch_id = BatchId::new();
        log_op_start!(
            "apply",
            workbook_id = %workbook_id,
            batch_id = %batch_id,
            op_count = batch.len()
        );

        let result = self.apply_inner(batch, session, vault, &workbook_id, &batch_id);
        match &result {
            Ok(report) => {
                log_op_end!(
                    "apply",
                    duration_ms = elapsed_ms(started),
                    batch_id = %batch_id,
                    state = report.apply_result.state.as_str()
                );
            }
            Err(err) => log_op_error!(
                "apply",
                err.clone(),
                duration_ms = elapsed_ms(started),
                batch_id = %batch_id
            ),
        }
        result
    }

    fn apply_inner(
        &self,
        batch: &Batch,
        session: &mut dyn WorkbookSession,
        vault: Option<&mut dyn SnapshotVault>,
        workbook_id: &WorkbookId,
        batch_id: &BatchId,
    ) -> Result<ApplyReport> {
        let _lease = self.guard.try_acquire(workbook_id)?;
        let mut machine = BatchStateMachine::new();

        // 1. Validate the whole batch
        machine.transition(BatchState::Validating)?;
        let ordered = batch.ordered();
        let schema = self.read_schema(session)?;
        let validations = self.validator.validate_batch(&ordered, &schema);
        let reference_checks = self.reference_checks(batch, &ordered);

        let finish = |validations: Vec<ValidationResult>, apply_result: ApplyResult| {
            let error_summary = summarize_errors(
                &validations,
                &apply_result.operations,
                apply_result.fault.as_ref(),
            );
            ApplyReport {
                batch_id: batch_id.clone(),
                workbook_id: workbook_id.clone(),
                validations,
                apply_result,
                reference_checks: reference_checks.clone(),
                error_summary,
            }
        };

        if validations.iter().any(|v| !v.valid) {
            machine.transition(BatchState::Rejected)?;
            let result = unapplied_result(&ordered, BatchState::Rejected, None);
            return Ok(finish(validations, result));
        }

        // 2. Snapshot touched sheets
        machine.transition(BatchState::Snapshotting)?;
        let snapshot = match self
            .snapshots
            .capture(&*session, &batch.touched_sheets(), batch_id)
        {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::error!(batch_id = %batch_id, error = %err, "snapshot capture failed; nothing applied");
                machine.transition(BatchState::FailedSnapshot)?;
                let result = unapplied_result(&ordered, BatchState::FailedSnapshot, Some(&err));
                return Ok(finish(validations, result));
            }
        };

        // 3. Apply in order
        machine.transition(BatchState::Applying)?;
        let ctx = ExecContext {
            default_sheet: &self.config.default_sheet,
            io_timeout: self.config.io_timeout(),
        };
        let mut outcomes: Vec<OperationOutcome> =
            ordered.iter().map(|op| OperationOutcome::not_attempted(op.index)).collect();
        let mut applied: Vec<u32> = Vec::new();
        let mut failure: Option<(Option<u32>, SheetXError)> = None;

        for (slot, op) in ordered.iter().enumerate() {
            let (attempts, result) = self.run_with_retry(op, session, &ctx);
            let outcome = &mut outcomes[slot];
            outcome.attempts = attempts;
            match result {
                Ok(()) => {
                    outcome.applied = true;
                    applied.push(op.index);
                }
                Err(err) => {
                    outcome.error = Some(err.kind());
                    outcome.message = Some(err.to_string());
                    failure = Some((Some(op.index), err));
                    break;
                }
            }
        }

        let history = if failure.is_none() {
            let records = change_records(batch_id, &ordered);
            match bounded("append_history", ctx.io_timeout, || session.append_history(&records)) {
                Ok(()) => records,
                Err(e) => {
                    failure = Some((
                        None,
                        crate::executors::executor_error(&self.config.default_sheet, e),
                    ));
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        // 4a. Roll back on the first failure
        if let Some((failed_at_index, err)) = failure {
            tracing::warn!(
                batch_id = %batch_id,
                failed_at_index = ?failed_at_index,
                applied = ?applied,
                error = %err,
                "operation failed; restoring snapshot"
            );
            machine.transition(BatchState::RollingBack)?;
            let (state, fault) = match self.snapshots.restore(session, &snapshot, &applied) {
                Ok(()) => (BatchState::RolledBack, BatchFault::from(&err)),
                Err(restore_err) => {
                    tracing::error!(
                        batch_id = %batch_id,
                        applied = ?applied,
                        error = %restore_err,
                        "restore failed; workbook may be inconsistent"
                    );
                    (BatchState::RestoreFailed, BatchFault::from(&restore_err))
                }
            };
            machine.transition(state)?;
            let result = ApplyResult {
                state,
                committed: false,
                rolled_back: state == BatchState::RolledBack,
                failed_at_index,
                operations: outcomes,
                applied_before_failure: applied,
                fault: Some(fault),
                snapshot_retained: false,
                history: Vec::new(),
            };
            return Ok(finish(validations, result));
        }

        // 4b. Commit
        machine.transition(BatchState::Committed)?;
        let snapshot_retained = match vault {
            Some(vault) => self.retain(&*session, vault, snapshot),
            None => false,
        };
        let result = ApplyResult {
            state: BatchState::Committed,
            committed: true,
            rolled_back: false,
            failed_at_index: None,
            operations: outcomes,
            applied_before_failure: Vec::new(),
            fault: None,
            snapshot_retained,
            history,
        };
        Ok(finish(validations, result))
    }

    /// Restore a committed batch from its retained snapshot
    ///
    /// # Errors
    ///
    /// Returns `BatchInProgress`, `SnapshotNotFound`, `SnapshotExpired`,
    /// `RetainedStateChanged` when the touched sheets no longer hold what
    /// the batch committed, or `Restore` if writing the snapshot back
    /// fails. The retained snapshot is only dropped once restore succeeds.
    pub fn rollback_retained(
        &self,
        batch_id: &BatchId,
        session: &mut dyn WorkbookSession,
        vault: &mut dyn SnapshotVault,
    ) -> Result<Snapshot> {
        let started = Instant::now();
        let workbook_id = session.workbook_id();
        log_op_start!("rollback_retained", workbook_id = %workbook_id, batch_id = %batch_id);

        let result = self.guard.try_acquire(&workbook_id).and_then(|_lease| {
            let retained = vault.get(&workbook_id, batch_id)?;
            if retained.is_expired(Utc::now()) {
                vault.remove(&workbook_id, batch_id)?;
                return Err(SheetXError::SnapshotExpired {
                    batch_id: batch_id.to_string(),
                });
            }

            let names: BTreeSet<String> = retained.snapshot.sheets.keys().cloned().collect();
            let current = self.snapshots.capture(&*session, &names, batch_id)?;
            if !retained.restorable_over(&current)? {
                return Err(SheetXError::RetainedStateChanged {
                    batch_id: batch_id.to_string(),
                });
            }

            // Entry stays in the vault until the restore has landed.
            self.snapshots.restore(session, &retained.snapshot, &[])?;
            if let Err(err) = vault.remove(&workbook_id, batch_id) {
                tracing::warn!(batch_id = %batch_id, error = %err, "restored but could not drop retained snapshot");
            }
            Ok(retained.snapshot)
        });

        match &result {
            Ok(_) => {
                log_op_end!("rollback_retained", duration_ms = elapsed_ms(started));
            }
            Err(err) => log_op_error!("rollback_retained", err.clone(), duration_ms = elapsed_ms(started)),
        }
        result
    }

    fn run_with_retry(
        &self,
        op: &SequencedOperation,
        session: &mut dyn WorkbookSession,
        ctx: &ExecContext<'_>,
    ) -> (u32, Result<()>) {
        let max_attempts = if op.operation.is_idempotent() {
            self.config.retry.max_attempts
        } else {
            1
        };

        let mut attempt = 1;
        loop {
            let delay = self.config.retry.backoff_for(attempt);
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            match execute(&op.operation, session, ctx) {
                Ok(()) => {
                    tracing::debug!(op_index = op.index, kind = op.operation.kind_name(), attempt, "operation applied");
                    return (attempt, Ok(()));
                }
                Err(SheetXError::TransientIo { message }) if attempt < max_attempts => {
                    tracing::warn!(op_index = op.index, attempt, max_attempts, %message, "transient failure; retrying");
                    attempt += 1;
                }
                Err(err) => return (attempt, Err(err)),
            }
        }
    }

    fn retain(&self, session: &dyn WorkbookSession, vault: &mut dyn SnapshotVault, snapshot: Snapshot) -> bool {
        let expires_at = snapshot.taken_at
            + chrono::Duration::from_std(self.config.retention()).unwrap_or_else(|_| chrono::Duration::zero());
        let batch_id = snapshot.batch_id.clone();
        let names: BTreeSet<String> = snapshot.sheets.keys().cloned().collect();
        let committed = match self
            .snapshots
            .capture(session, &names, &batch_id)
            .and_then(|captured| CommittedState::of(&captured))
        {
            Ok(committed) => committed,
            Err(err) => {
                tracing::warn!(batch_id = %batch_id, error = %err, "could not read committed state; snapshot not retained");
                return false;
            }
        };
        let retained = RetainedSnapshot {
            snapshot,
            expires_at,
            committed,
        };
        match vault.put(retained) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(batch_id = %batch_id, error = %err, "could not retain snapshot");
                false
            }
        }
    }

    fn reference_checks(&self, batch: &Batch, ordered: &[&SequencedOperation]) -> Vec<ReferenceCheck> {
        ordered
            .iter()
            .filter_map(|op| {
                let reference = batch.references.get(&op.index)?;
                self.matcher.check(op, reference)
            })
            .collect()
    }

    fn read_schema(&self, session: &dyn WorkbookSession) -> Result<WorkbookSchema> {
        bounded("schema", self.config.io_timeout(), || session.schema()).map_err(|e| {
            SheetXError::SnapshotCapture {
                sheet: None,
                message: format!("cannot read workbook schema: {}", e),
            }
        })
    }
}

fn unapplied_result(ordered: &[&SequencedOperation], state: BatchState, err: Option<&SheetXError>) -> ApplyResult {
    ApplyResult {
        state,
        committed: false,
        rolled_back: false,
        failed_at_index: None,
        operations: ordered
            .iter()
            .map(|op| OperationOutcome::not_attempted(op.index))
            .collect(),
        applied_before_failure: Vec::new(),
        fault: err.map(BatchFault::from),
        snapshot_retained: false,
        history: Vec::new(),
    }
}

fn change_records(batch_id: &BatchId, ordered: &[&SequencedOperation]) -> Vec<ChangeRecord> {
    let at = Utc::now();
    ordered
        .iter()
        .map(|op| ChangeRecord {
            batch_id: batch_id.clone(),
            index: op.index,
            kind: op.operation.kind_name().to_string(),
            sheet: op.operation.sheet().to_string(),
            target: op.operation.target(),
            at,
        })
        .collect()
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
