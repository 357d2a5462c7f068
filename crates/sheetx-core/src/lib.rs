//! SheetX Core - transactional execution of spreadsheet edit batches
//!
//! This crate holds the in-memory domain kernel:
//! - Grid addressing and the workbook/operation data model
//! - `OperationValidator`: collects every defect before anything is written
//! - `ReferenceMatcher`: advisory comparison with external reference data
//! - `SnapshotManager`: capture and idempotent restore of touched sheets
//! - Operation executors, one per operation kind
//! - `TransactionalApplier`: the validate, snapshot, apply, commit-or-rollback
//!   state machine, guarded to one batch per workbook
//!
//! Persistence lives in `sheetx-store`; orchestration in `sheetx-engine`.

pub mod apply;
pub mod config;
pub mod errors;
pub mod executors;
pub mod guard;
pub mod io;
pub mod logging_facility;
pub mod model;
pub mod reference;
pub mod report;
pub mod rules;
pub mod session;
pub mod snapshot;
pub mod state;

pub use sheetx_core_types::schema;

// Re-export commonly used types
pub use apply::TransactionalApplier;
pub use config::ApplierConfig;
pub use errors::{ErrorCategory, ExError, ExErrorKind, Result, SheetXError};
pub use guard::{BatchGuard, BatchLease};
pub use model::{
    AxisAction, Batch, CellInput, CellValue, FormatKind, MetricTag, Operation, SequencedOperation,
    Sheet, Workbook,
};
pub use reference::{ReferenceCheck, ReferenceMatcher, ReferenceValue};
pub use report::{ApplyReport, ApplyResult, Outcome, SimulationReport, ValidationResult};
pub use session::{SessionError, WorkbookSession};
pub use snapshot::{Snapshot, SnapshotManager, SnapshotVault};
pub use state::BatchState;
