//! Result records handed back to the presentation layer

use crate::errors::{ErrorCategory, ExErrorKind, SheetXError};
use crate::model::ChangeRecord;
use crate::reference::ReferenceCheck;
use crate::state::BatchState;
use serde::{Deserialize, Serialize};
use sheetx_core_types::{BatchId, WorkbookId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub index: u32,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ValidationResult {
    pub fn ok(index: u32) -> Self {
        Self {
            index,
            valid: true,
            reason: None,
            code: None,
        }
    }

    pub fn rejected(index: u32, err: &SheetXError) -> Self {
        Self {
            index,
            valid: false,
            reason: Some(err.to_string()),
            code: Some(err.code().to_string()),
        }
    }
}

/// What happened to one operation during apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub index: u32,
    pub applied: bool,
    /// Executor calls made, retries included; zero if never reached
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ExErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OperationOutcome {
    pub fn not_attempted(index: u32) -> Self {
        Self {
            index,
            applied: false,
            attempts: 0,
            error: None,
            message: None,
        }
    }
}

/// Batch-level failure, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFault {
    pub kind: ExErrorKind,
    pub code: String,
    pub message: String,
    /// Operator intervention needed; workbook may be inconsistent
    pub fatal: bool,
}

impl From<&SheetXError> for BatchFault {
    fn from(err: &SheetXError) -> Self {
        let kind = err.kind();
        Self {
            kind,
            code: kind.code().to_string(),
            message: err.to_string(),
            fatal: kind.is_fatal(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyResult {
    pub state: BatchState,
    pub committed: bool,
    pub rolled_back: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at_index: Option<u32>,
    pub operations: Vec<OperationOutcome>,
    /// Indices whose effects reached the workbook before a failure
    pub applied_before_failure: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<BatchFault>,
    /// Snapshot kept for external rollback until the retention window ends
    pub snapshot_retained: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ChangeRecord>,
}

impl ApplyResult {
    /// Caller-facing outcome class
    pub fn outcome(&self) -> Outcome {
        match self.state {
            BatchState::Committed => Outcome::Committed,
            BatchState::RolledBack => Outcome::RolledBack,
            BatchState::RestoreFailed => Outcome::PossiblyInconsistent,
            _ => Outcome::Unchanged,
        }
    }
}

/// Distinguishes "nothing changed" from "rolled back" from "check by hand"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Committed,
    Unchanged,
    RolledBack,
    PossiblyInconsistent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedOperation {
    pub index: u32,
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub batch_id: BatchId,
    pub workbook_id: WorkbookId,
    pub state: BatchState,
    pub executable: bool,
    pub validations: Vec<ValidationResult>,
    pub reference_checks: Vec<ReferenceCheck>,
    /// Operations in apply order; empty when the batch is not executable
    pub would_apply: Vec<PlannedOperation>,
    pub error_summary: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub batch_id: BatchId,
    pub workbook_id: WorkbookId,
    pub validations: Vec<ValidationResult>,
    pub apply_result: ApplyResult,
    pub reference_checks: Vec<ReferenceCheck>,
    /// Failure counts keyed by error code
    pub error_summary: BTreeMap<String, usize>,
}

/// Count validation failures and executor faults by error code
pub fn summarize_errors(
    validations: &[ValidationResult],
    outcomes: &[OperationOutcome],
    fault: Option<&BatchFault>,
) -> BTreeMap<String, usize> {
    let mut summary = BTreeMap::new();
    let codes = validations
        .iter()
        .filter_map(|v| v.code.clone())
        .chain(outcomes.iter().filter_map(|o| o.error.map(|k| k.code().to_string())))
        // executor faults are already counted on their operation
        .chain(
            fault
                .filter(|f| f.kind.category() != ErrorCategory::Executor)
                .map(|f| f.code.clone()),
        );
    for code in codes {
        *summary.entry(code).or_insert(0) += 1;
    }
    summary
}
