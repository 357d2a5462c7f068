//! Shared fixtures for sheetx-core integration tests

#![allow(dead_code)]

use sheetx_core::model::{ChangeRecord, NamedRanges, WorkbookSchema};
use sheetx_core::session::InMemorySession;
use sheetx_core::{
    ApplierConfig, AxisAction, CellInput, CellValue, FormatKind, Operation, SessionError, Sheet,
    TransactionalApplier, Workbook, WorkbookSession,
};
use sheetx_core_types::WorkbookId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

/// Session calls a fault can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionCall {
    Schema,
    ReadSheet,
    WriteSheet,
    RemoveSheet,
    NamedRanges,
    WriteNamedRanges,
    AppendHistory,
}

/// What to do to one call
pub enum Fault {
    Fail(SessionError),
    /// Sleep, then perform the call normally
    Delay(Duration),
}

type FaultPlan = Box<dyn Fn(SessionCall, u32, &str) -> Option<Fault>>;

/// In-memory session that fails or stalls calls on demand
///
/// The plan sees the call kind, its 1-based ordinal among calls of that
/// kind, and the sheet name involved (empty when none).
pub struct FaultInjectingSession {
    pub inner: InMemorySession,
    counts: RefCell<HashMap<SessionCall, u32>>,
    plan: FaultPlan,
}

impl FaultInjectingSession {
    pub fn new(workbook: Workbook, plan: impl Fn(SessionCall, u32, &str) -> Option<Fault> + 'static) -> Self {
        Self {
            inner: InMemorySession::new(workbook),
            counts: RefCell::new(HashMap::new()),
            plan: Box::new(plan),
        }
    }

    pub fn workbook(&self) -> &Workbook {
        self.inner.workbook()
    }

    pub fn calls(&self, call: SessionCall) -> u32 {
        self.counts.borrow().get(&call).copied().unwrap_or(0)
    }

    fn intercept(&self, call: SessionCall, sheet: &str) -> Result<(), SessionError> {
        let n = {
            let mut counts = self.counts.borrow_mut();
            let n = counts.entry(call).or_insert(0);
            *n += 1;
            *n
        };
        match (self.plan)(call, n, sheet) {
            Some(Fault::Fail(err)) => Err(err),
            Some(Fault::Delay(d)) => {
                std::thread::sleep(d);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl WorkbookSession for FaultInjectingSession {
    fn workbook_id(&self) -> WorkbookId {
        self.inner.workbook_id()
    }

    fn schema(&self) -> Result<WorkbookSchema, SessionError> {
        self.intercept(SessionCall::Schema, "")?;
        self.inner.schema()
    }

    fn read_sheet(&self, name: &str) -> Result<Option<Sheet>, SessionError> {
        self.intercept(SessionCall::ReadSheet, name)?;
        self.inner.read_sheet(name)
    }

    fn write_sheet(&mut self, sheet: &Sheet) -> Result<(), SessionError> {
        self.intercept(SessionCall::WriteSheet, &sheet.name)?;
        self.inner.write_sheet(sheet)
    }

    fn remove_sheet(&mut self, name: &str) -> Result<(), SessionError> {
        self.intercept(SessionCall::RemoveSheet, name)?;
        self.inner.remove_sheet(name)
    }

    fn named_ranges(&self) -> Result<NamedRanges, SessionError> {
        self.intercept(SessionCall::NamedRanges, "")?;
        self.inner.named_ranges()
    }

    fn write_named_ranges(&mut self, ranges: &NamedRanges) -> Result<(), SessionError> {
        self.intercept(SessionCall::WriteNamedRanges, "")?;
        self.inner.write_named_ranges(ranges)
    }

    fn append_history(&mut self, records: &[ChangeRecord]) -> Result<(), SessionError> {
        self.intercept(SessionCall::AppendHistory, "")?;
        self.inner.append_history(records)
    }
}

pub fn transient(message: &str) -> SessionError {
    SessionError::Transient {
        message: message.to_string(),
    }
}

/// Workbook with `Sheet1` (10 x 5) holding a small revenue table and an
/// empty `Costs` sheet
pub fn seeded_workbook() -> Workbook {
    let mut wb = Workbook::new("book-1", "Sheet1");
    let mut sheet = Sheet::with_dims("Sheet1", 10, 5);
    sheet.set_value(cell("A1"), CellValue::Text("Quarter".to_string()));
    sheet.set_value(cell("B1"), CellValue::Text("Revenue".to_string()));
    for (i, q) in ["Q1", "Q2", "Q3", "Q4"].iter().enumerate() {
        let row = i as u32 + 2;
        sheet.set_value(cell(&format!("A{}", row)), CellValue::Text(q.to_string()));
        sheet.set_value(cell(&format!("B{}", row)), CellValue::Number(100.0 * (i as f64 + 1.0)));
    }
    sheet.cell_mut(cell("B2")).style.number_format = Some("$#,##0.00".to_string());
    wb.sheets.insert("Sheet1".to_string(), sheet);
    wb.sheets.insert("Costs".to_string(), Sheet::with_dims("Costs", 20, 8));
    wb
}

/// Default config without retry backoff delays
pub fn fast_config() -> ApplierConfig {
    let mut config = ApplierConfig::default();
    config.retry.backoff_ms = 0;
    config
}

pub fn applier() -> TransactionalApplier {
    TransactionalApplier::new(fast_config()).unwrap()
}

pub fn cell(s: &str) -> sheetx_core::model::CellAddr {
    s.parse().unwrap()
}

pub fn write(sheet: &str, cell: &str, value: impl Into<CellInput>) -> Operation {
    Operation::CellWrite {
        sheet: sheet.to_string(),
        cell: cell.to_string(),
        value: value.into(),
    }
}

pub fn formula(sheet: &str, cell: &str, text: &str) -> Operation {
    Operation::FormulaWrite {
        sheet: sheet.to_string(),
        cell: cell.to_string(),
        formula: text.to_string(),
    }
}

pub fn format(sheet: &str, range: &str, kind: FormatKind) -> Operation {
    Operation::FormatRange {
        sheet: sheet.to_string(),
        range: range.to_string(),
        format: kind,
    }
}

pub fn column(sheet: &str, column: &str, action: AxisAction, param: Option<f64>) -> Operation {
    Operation::ColumnOp {
        sheet: sheet.to_string(),
        column: column.to_string(),
        action,
        param,
    }
}
