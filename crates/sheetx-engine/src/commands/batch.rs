//! Batch simulate/apply orchestration
//!
//! ## Pipeline
//! 1. Workbook identity check: a batch addressed to another workbook is
//!    refused before any read
//! 2. Simulation or transactional apply through the core applier
//! 3. Review payload assembly

use crate::commands::review::ReviewPayload;
use sheetx_core::errors::{ExError, ExErrorKind};
use sheetx_core::{Batch, SnapshotVault, TransactionalApplier, WorkbookSession};
use sheetx_store::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Keep the committed batch's snapshot for later rollback
    pub retain_snapshot: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            retain_snapshot: true,
        }
    }
}

/// Validate and cross-check a batch without writing
///
/// # Errors
///
/// Returns `InvalidInput` for a batch addressed elsewhere, or the
/// applier's `BatchInProgress` / `SnapshotCapture` errors.
pub fn simulate_batch(
    batch: &Batch,
    applier: &TransactionalApplier,
    session: &dyn WorkbookSession,
) -> Result<ReviewPayload> {
    check_target(batch, session)?;
    let report = applier.simulate(batch, session)?;
    Ok(ReviewPayload::from_simulation(report))
}

/// Apply a batch; the payload reports commit, rejection or rollback
///
/// # Errors
///
/// Returns `InvalidInput` for a batch addressed elsewhere, or the
/// applier's `BatchInProgress` / `SnapshotCapture` errors.
pub fn apply_batch(
    batch: &Batch,
    options: ApplyOptions,
    applier: &TransactionalApplier,
    session: &mut dyn WorkbookSession,
    vault: &mut dyn SnapshotVault,
) -> Result<ReviewPayload> {
    check_target(batch, &*session)?;
    let vault = options.retain_snapshot.then_some(vault);
    let report = applier.apply(batch, session, vault)?;
    Ok(ReviewPayload::from_apply(batch, report))
}

fn check_target(batch: &Batch, session: &dyn WorkbookSession) -> Result<()> {
    let actual = session.workbook_id();
    match &batch.workbook_id {
        Some(expected) if expected != &actual => Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("check_target")
            .with_entity_id(expected.as_str())
            .with_message(format!(
                "batch addressed to workbook '{}' but session holds '{}'",
                expected, actual
            ))),
        _ => Ok(()),
    }
}
