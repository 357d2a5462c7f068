// Engine command tests over a file-backed workbook and vault
// Covers simulate → apply → rollback of a retained batch, and purge

#![allow(clippy::unwrap_used, clippy::expect_used)]

use sheetx_core::logging_facility::test_capture::init_test_capture;
use sheetx_core::{
    ApplierConfig, Batch, CellInput, CellValue, FormatKind, Operation, Outcome, Sheet,
    TransactionalApplier, Workbook, WorkbookSession,
};
use sheetx_engine::{apply_engine_command, ApplyOptions, EngineCommand, EngineCommandResult};
use sheetx_store::{FsSnapshotVault, FsWorkbookSession};
use tempfile::TempDir;

fn setup() -> (TempDir, FsWorkbookSession, FsSnapshotVault) {
    let temp_dir = TempDir::new().unwrap();
    let mut workbook = Workbook::new("budget", "Sheet1");
    let mut sheet = Sheet::with_dims("Sheet1", 6, 4);
    sheet.set_value("A1".parse().unwrap(), CellValue::Text("Line".to_string()));
    sheet.set_value("B2".parse().unwrap(), CellValue::Number(120.0));
    workbook.sheets.insert("Sheet1".to_string(), sheet);

    let session = FsWorkbookSession::create(temp_dir.path().join("budget.json"), &workbook).unwrap();
    let vault = FsSnapshotVault::new(temp_dir.path().join("vault"));
    (temp_dir, session, vault)
}

fn applier() -> TransactionalApplier {
    TransactionalApplier::new(ApplierConfig::default()).unwrap()
}

fn budget_batch() -> Batch {
    Batch::from_operations([
        Operation::CellWrite {
            sheet: "Sheet1".to_string(),
            cell: "B1".to_string(),
            value: CellInput::Text("Amount".to_string()),
        },
        Operation::FormatRange {
            sheet: "Sheet1".to_string(),
            range: "B2:B6".to_string(),
            format: FormatKind::Currency,
        },
        Operation::FormulaWrite {
            sheet: "Sheet1".to_string(),
            cell: "B7".to_string(),
            formula: "=SUM(B2:B6)".to_string(),
        },
    ])
    .for_workbook("budget")
}

#[test]
fn test_simulate_then_apply_then_rollback() {
    let (_dir, mut session, mut vault) = setup();
    let applier = applier();
    let before = session.load().unwrap();

    // Simulate: executable, nothing written
    let simulated = apply_engine_command(
        EngineCommand::Simulate { batch: budget_batch() },
        &applier,
        &mut session,
        &mut vault,
    )
    .unwrap();
    let EngineCommandResult::Simulated(review) = simulated else {
        panic!("expected a simulation payload");
    };
    assert!(review.executable);
    assert_eq!(review.would_apply.len(), 3);
    assert_eq!(session.load().unwrap(), before);

    // Apply: committed and retained
    let applied = apply_engine_command(
        EngineCommand::Apply {
            batch: budget_batch(),
            options: ApplyOptions::default(),
        },
        &applier,
        &mut session,
        &mut vault,
    )
    .unwrap();
    let EngineCommandResult::Applied(review) = applied else {
        panic!("expected an apply payload");
    };
    assert_eq!(review.outcome, Some(Outcome::Committed));
    assert!(review.apply_result.as_ref().unwrap().snapshot_retained);
    let sheet = session.read_sheet("Sheet1").unwrap().unwrap();
    assert_eq!(sheet.cell("B7".parse().unwrap()).unwrap().formula.as_deref(), Some("=SUM(B2:B6)"));

    // Rollback: sheets back to the pre-batch state
    let rolled = apply_engine_command(
        EngineCommand::RollbackRetained {
            batch_id: review.batch_id.clone(),
        },
        &applier,
        &mut session,
        &mut vault,
    )
    .unwrap();
    let EngineCommandResult::RolledBack(rollback) = rolled else {
        panic!("expected a rollback result");
    };
    assert_eq!(rollback.restored_sheets, vec!["Sheet1".to_string()]);
    assert!(rollback.removed_sheets.is_empty());
    assert_eq!(session.load().unwrap().sheets, before.sheets);
}

#[test]
fn test_rejected_apply_reports_unchanged() {
    let (_dir, mut session, mut vault) = setup();
    let batch = Batch::from_operations([Operation::CellWrite {
        sheet: "Sheet1".to_string(),
        cell: "B2".to_string(),
        value: CellInput::Number(f64::NAN),
    }]);

    let result = apply_engine_command(
        EngineCommand::Apply {
            batch,
            options: ApplyOptions::default(),
        },
        &applier(),
        &mut session,
        &mut vault,
    )
    .unwrap();

    let EngineCommandResult::Applied(review) = result else {
        panic!("expected an apply payload");
    };
    assert!(!review.executable);
    assert_eq!(review.outcome, Some(Outcome::Unchanged));
    assert!(review.would_apply.is_empty());
}

#[test]
fn test_unknown_rollback_logs_error() {
    let capture = init_test_capture();
    let (_dir, mut session, mut vault) = setup();

    let err = apply_engine_command(
        EngineCommand::RollbackRetained {
            batch_id: sheetx_core_types::BatchId::from_string("no-such-batch".to_string()),
        },
        &applier(),
        &mut session,
        &mut vault,
    )
    .unwrap_err();

    assert_eq!(err.code(), "ERR_NOT_FOUND");
    let logged = capture.count_events(|e| {
        e.op.as_deref() == Some("rollback_retained")
            && e.event.as_deref() == Some("end_error")
            && e.field("err.code") == Some("ERR_NOT_FOUND")
    });
    assert!(logged >= 1);
}

#[test]
fn test_purge_on_empty_vault() {
    let (_dir, mut session, mut vault) = setup();

    let result = apply_engine_command(EngineCommand::PurgeExpired, &applier(), &mut session, &mut vault).unwrap();

    assert_eq!(result, EngineCommandResult::Purged { count: 0 });
}

#[test]
fn test_result_serializes_with_tag() {
    let json = serde_json::to_value(EngineCommandResult::Purged { count: 2 }).unwrap();
    assert_eq!(json["result"], "purged");
    assert_eq!(json["count"], 2);
}
