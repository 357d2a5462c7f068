//! Snapshot Retention Tests
//!
//! A committed batch's snapshot stays in the vault for the retention window
//! and can be restored on request until then.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use chrono::{Duration, Utc};
use common::*;
use sheetx_core::snapshot::InMemorySnapshotVault;
use sheetx_core::{
    ApplierConfig, Batch, CellValue, Operation, SessionError, SheetXError, SnapshotVault,
    TransactionalApplier,
};
use sheetx_core_types::{BatchId, WorkbookId};

fn named_total() -> Operation {
    Operation::NamedRangeCreate {
        name: "Revenue_Total".to_string(),
        sheet: "Sheet1".to_string(),
        range: "B2:B5".to_string(),
    }
}

#[test]
fn test_committed_batch_can_be_rolled_back_later() {
    // GIVEN a committed batch whose snapshot was retained
    let mut session = FaultInjectingSession::new(seeded_workbook(), |_, _, _| None);
    let mut vault = InMemorySnapshotVault::new();
    let before = session.workbook().clone();
    let applier = applier();

    let batch = Batch::from_operations([write("Sheet1", "A1", "Period"), named_total()]);
    let report = applier.apply(&batch, &mut session, Some(&mut vault)).unwrap();
    assert!(report.apply_result.snapshot_retained);
    assert_eq!(vault.len(), 1);
    assert!(session.workbook().named_ranges.contains_key("REVENUE_TOTAL"));

    // WHEN the caller asks for a rollback
    let snapshot = applier
        .rollback_retained(&report.batch_id, &mut session, &mut vault)
        .unwrap();

    // THEN cells and names are back, history aside
    assert_eq!(snapshot.batch_id, report.batch_id);
    let wb = session.workbook();
    assert_eq!(wb.sheets, before.sheets);
    assert_eq!(wb.named_ranges, before.named_ranges);
    assert_eq!(
        wb.sheets["Sheet1"].value(cell("A1")),
        CellValue::Text("Quarter".to_string())
    );
    assert!(vault.is_empty());
}

#[test]
fn test_snapshot_is_consumed_by_rollback() {
    let mut session = FaultInjectingSession::new(seeded_workbook(), |_, _, _| None);
    let mut vault = InMemorySnapshotVault::new();
    let applier = applier();
    let report = applier
        .apply(&Batch::from_operations([write("Sheet1", "A1", 1.0)]), &mut session, Some(&mut vault))
        .unwrap();

    applier
        .rollback_retained(&report.batch_id, &mut session, &mut vault)
        .unwrap();
    let err = applier
        .rollback_retained(&report.batch_id, &mut session, &mut vault)
        .unwrap_err();

    assert!(matches!(err, SheetXError::SnapshotNotFound { .. }));
}

fn down() -> Fault {
    Fault::Fail(SessionError::Unavailable {
        message: "down".to_string(),
    })
}

#[test]
fn test_failed_restore_keeps_snapshot_for_retry() {
    // GIVEN a retained batch and a session whose second sheet write fails
    let mut session = FaultInjectingSession::new(seeded_workbook(), |call, n, _| {
        (call == SessionCall::WriteSheet && n == 2).then(down)
    });
    let mut vault = InMemorySnapshotVault::new();
    let before = session.workbook().clone();
    let applier = applier();
    let report = applier
        .apply(&Batch::from_operations([write("Sheet1", "A1", 5.0)]), &mut session, Some(&mut vault))
        .unwrap();

    // WHEN the first rollback hits the failing write
    let err = applier
        .rollback_retained(&report.batch_id, &mut session, &mut vault)
        .unwrap_err();

    // THEN the snapshot is still there and a second attempt restores
    assert!(matches!(err, SheetXError::Restore { .. }));
    assert_eq!(vault.len(), 1);
    applier
        .rollback_retained(&report.batch_id, &mut session, &mut vault)
        .unwrap();
    assert_eq!(session.workbook().sheets, before.sheets);
    assert!(vault.is_empty());
}

#[test]
fn test_retry_after_partial_restore() {
    // GIVEN a batch over two sheets; the restore writes Costs, then fails on Sheet1
    let mut session = FaultInjectingSession::new(seeded_workbook(), |call, n, _| {
        (call == SessionCall::WriteSheet && n == 4).then(down)
    });
    let mut vault = InMemorySnapshotVault::new();
    let before = session.workbook().clone();
    let applier = applier();
    let batch = Batch::from_operations([write("Sheet1", "A1", 5.0), write("Costs", "B2", 7.0)]);
    let report = applier.apply(&batch, &mut session, Some(&mut vault)).unwrap();
    assert!(report.apply_result.committed);

    let err = applier
        .rollback_retained(&report.batch_id, &mut session, &mut vault)
        .unwrap_err();
    assert_eq!(err.code(), "ERR_RESTORE");
    assert_eq!(session.workbook().sheets["Costs"], before.sheets["Costs"]);

    // WHEN the rollback is retried over the half-restored workbook
    applier
        .rollback_retained(&report.batch_id, &mut session, &mut vault)
        .unwrap();

    // THEN both sheets are back
    assert_eq!(session.workbook().sheets, before.sheets);
}

#[test]
fn test_rollback_refused_after_later_batch_on_same_sheet() {
    // GIVEN batch 1 then batch 2, both committed on Sheet1
    let mut session = FaultInjectingSession::new(seeded_workbook(), |_, _, _| None);
    let mut vault = InMemorySnapshotVault::new();
    let before = session.workbook().clone();
    let applier = applier();
    let first = applier
        .apply(&Batch::from_operations([write("Sheet1", "A1", 5.0)]), &mut session, Some(&mut vault))
        .unwrap();
    let second = applier
        .apply(&Batch::from_operations([write("Sheet1", "C9", 42.0)]), &mut session, Some(&mut vault))
        .unwrap();

    // WHEN batch 1 is rolled back on its own
    let err = applier
        .rollback_retained(&first.batch_id, &mut session, &mut vault)
        .unwrap_err();

    // THEN it is refused and batch 2's edit survives
    assert!(matches!(err, SheetXError::RetainedStateChanged { .. }));
    assert_eq!(err.code(), "ERR_ENVIRONMENT_CHANGED");
    assert_eq!(
        session.workbook().sheets["Sheet1"].value(cell("C9")),
        CellValue::Number(42.0)
    );
    assert_eq!(vault.len(), 2);

    // AND unwinding newest first works
    applier
        .rollback_retained(&second.batch_id, &mut session, &mut vault)
        .unwrap();
    applier
        .rollback_retained(&first.batch_id, &mut session, &mut vault)
        .unwrap();
    assert_eq!(session.workbook().sheets, before.sheets);
}

#[test]
fn test_later_batch_on_other_sheet_does_not_block() {
    let mut session = FaultInjectingSession::new(seeded_workbook(), |_, _, _| None);
    let mut vault = InMemorySnapshotVault::new();
    let applier = applier();
    let first = applier
        .apply(&Batch::from_operations([write("Sheet1", "A1", 5.0)]), &mut session, Some(&mut vault))
        .unwrap();
    applier
        .apply(&Batch::from_operations([write("Costs", "C3", 42.0)]), &mut session, Some(&mut vault))
        .unwrap();

    applier
        .rollback_retained(&first.batch_id, &mut session, &mut vault)
        .unwrap();

    let wb = session.workbook();
    assert_eq!(wb.sheets["Sheet1"].value(cell("A1")), CellValue::Text("Quarter".to_string()));
    assert_eq!(wb.sheets["Costs"].value(cell("C3")), CellValue::Number(42.0));
}

#[test]
fn test_unknown_batch_not_found() {
    let mut session = FaultInjectingSession::new(seeded_workbook(), |_, _, _| None);
    let mut vault = InMemorySnapshotVault::new();

    let err = applier()
        .rollback_retained(&BatchId::new(), &mut session, &mut vault)
        .unwrap_err();

    assert_eq!(err.code(), "ERR_NOT_FOUND");
}

#[test]
fn test_expired_snapshot_refused() {
    // GIVEN a zero-length retention window
    let mut config = fast_config();
    config.retention_secs = 0;
    let applier = TransactionalApplier::new(config).unwrap();
    let mut session = FaultInjectingSession::new(seeded_workbook(), |_, _, _| None);
    let mut vault = InMemorySnapshotVault::new();

    let report = applier
        .apply(&Batch::from_operations([write("Sheet1", "A1", 1.0)]), &mut session, Some(&mut vault))
        .unwrap();
    let after_commit = session.workbook().clone();

    // WHEN rollback is requested
    let err = applier
        .rollback_retained(&report.batch_id, &mut session, &mut vault)
        .unwrap_err();

    // THEN it is refused and the committed state stands
    assert!(matches!(err, SheetXError::SnapshotExpired { .. }));
    assert_eq!(session.workbook(), &after_commit);
}

#[test]
fn test_purge_drops_only_expired() {
    let mut session = FaultInjectingSession::new(seeded_workbook(), |_, _, _| None);
    let mut vault = InMemorySnapshotVault::new();
    let applier = applier();

    for value in [1.0, 2.0] {
        applier
            .apply(&Batch::from_operations([write("Sheet1", "C2", value)]), &mut session, Some(&mut vault))
            .unwrap();
    }
    let book = WorkbookId::new("book-1");
    assert_eq!(vault.list(&book).unwrap().len(), 2);

    assert_eq!(vault.purge_expired(Utc::now()).unwrap(), 0);
    let window = i64::try_from(ApplierConfig::default().retention_secs).unwrap();
    let later = Utc::now() + Duration::seconds(window + 1);
    assert_eq!(vault.purge_expired(later).unwrap(), 2);
    assert!(vault.list(&book).unwrap().is_empty());
}

#[test]
fn test_failed_batches_retain_nothing() {
    let mut vault = InMemorySnapshotVault::new();
    let applier = applier();

    // rejected
    let mut session = FaultInjectingSession::new(seeded_workbook(), |_, _, _| None);
    let rejected = applier
        .apply(&Batch::from_operations([write("Sheet1", "A0", 1.0)]), &mut session, Some(&mut vault))
        .unwrap();
    // rolled back
    let mut failing = FaultInjectingSession::new(seeded_workbook(), |call, n, _| {
        (call == SessionCall::WriteSheet && n == 1).then(|| Fault::Fail(transient("busy")))
    });
    let rolled_back = applier
        .apply(&Batch::from_operations([write("Sheet1", "A1", 1.0)]), &mut failing, Some(&mut vault))
        .unwrap();

    assert!(!rejected.apply_result.snapshot_retained);
    assert!(!rolled_back.apply_result.snapshot_retained);
    assert!(vault.is_empty());
}
