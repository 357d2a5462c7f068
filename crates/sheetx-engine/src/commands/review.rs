//! Review payload handed to a presentation layer
//!
//! One shape for both simulation and apply, so a reviewer sees the same
//! fields before accepting a batch and after it ran.

use serde::{Deserialize, Serialize};
use sheetx_core::report::PlannedOperation;
use sheetx_core::{
    ApplyReport, ApplyResult, Batch, Outcome, ReferenceCheck, SheetXError, SimulationReport,
    ValidationResult,
};
use sheetx_core_types::{BatchId, WorkbookId};
use sheetx_store::errors::Result;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewMode {
    Simulation,
    Apply,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPayload {
    pub mode: ReviewMode,
    pub batch_id: BatchId,
    pub workbook_id: WorkbookId,
    /// Every operation passed validation
    pub executable: bool,
    pub validations: Vec<ValidationResult>,
    pub reference_checks: Vec<ReferenceCheck>,
    /// Reference checks outside tolerance
    pub flagged_references: usize,
    pub would_apply: Vec<PlannedOperation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_result: Option<ApplyResult>,
    pub error_summary: BTreeMap<String, usize>,
}

impl ReviewPayload {
    pub fn from_simulation(report: SimulationReport) -> Self {
        Self {
            mode: ReviewMode::Simulation,
            flagged_references: flagged(&report.reference_checks),
            batch_id: report.batch_id,
            workbook_id: report.workbook_id,
            executable: report.executable,
            validations: report.validations,
            reference_checks: report.reference_checks,
            would_apply: report.would_apply,
            outcome: None,
            apply_result: None,
            error_summary: report.error_summary,
        }
    }

    /// `batch` supplies the operation descriptions the report does not carry
    pub fn from_apply(batch: &Batch, report: ApplyReport) -> Self {
        let executable = report.validations.iter().all(|v| v.valid);
        let would_apply = if executable { planned(batch) } else { Vec::new() };
        Self {
            mode: ReviewMode::Apply,
            flagged_references: flagged(&report.reference_checks),
            batch_id: report.batch_id,
            workbook_id: report.workbook_id,
            executable,
            validations: report.validations,
            reference_checks: report.reference_checks,
            would_apply,
            outcome: Some(report.apply_result.outcome()),
            apply_result: Some(report.apply_result),
            error_summary: report.error_summary,
        }
    }

    /// Pretty JSON for display or hand-off
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SheetXError::from(e).into())
    }
}

fn flagged(checks: &[ReferenceCheck]) -> usize {
    checks.iter().filter(|c| !c.within_tolerance).count()
}

fn planned(batch: &Batch) -> Vec<PlannedOperation> {
    batch
        .ordered()
        .into_iter()
        .map(|op| PlannedOperation {
            index: op.index,
            kind: op.operation.kind_name().to_string(),
            description: op.operation.describe(),
        })
        .collect()
}
