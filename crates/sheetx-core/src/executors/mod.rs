//! One executor per operation kind
//!
//! Executors trust validation for syntax and bounds but re-check
//! everything that an outside actor could have changed since: a sheet
//! going missing, a name appearing, lines disappearing. Those races
//! surface as `EnvironmentChanged`.
//!
//! Each executor is a read-modify-write of whole sheets through the
//! session, so sources are read at execution time and see earlier writes
//! of the same batch.

mod axis;
mod cells;
mod names;
mod ranges;

use crate::errors::{Result, SheetXError};
use crate::io::{bounded, IoFailure};
use crate::model::{NamedRanges, Operation, Sheet};
use crate::session::{SessionError, WorkbookSession};
use std::time::Duration;

/// What an executor needs besides the operation itself
#[derive(Debug, Clone)]
pub struct ExecContext<'a> {
    pub default_sheet: &'a str,
    pub io_timeout: Duration,
}

/// Apply one validated operation
///
/// # Errors
///
/// Returns `EnvironmentChanged`, `TransientIo`, `Unsupported` or `Timeout`.
pub fn execute(op: &Operation, session: &mut dyn WorkbookSession, ctx: &ExecContext<'_>) -> Result<()> {
    match op {
        Operation::CellWrite { sheet, cell, value } => cells::write_value(session, ctx, sheet, cell, value),
        Operation::FormulaWrite {
            sheet,
            cell,
            formula,
        } => cells::write_formula(session, ctx, sheet, cell, formula),
        Operation::FormatRange {
            sheet,
            range,
            format,
        } => ranges::format(session, ctx, sheet, range, format),
        Operation::ColumnOp {
            sheet,
            column,
            action,
            param,
        } => axis::column(session, ctx, sheet, column, *action, *param),
        Operation::RowOp {
            sheet,
            row,
            action,
            param,
        } => axis::row(session, ctx, sheet, *row, *action, *param),
        Operation::RangeCopy {
            sheet,
            src_range,
            dest_cell,
        } => ranges::copy(session, ctx, sheet, src_range, dest_cell),
        Operation::RangeClear { sheet, range } => ranges::clear(session, ctx, sheet, range),
        Operation::NamedRangeCreate { name, sheet, range } => {
            names::create(session, ctx, name, sheet, range)
        }
    }
}

/// Read a sheet for modification; the default sheet springs into being
fn load_sheet(session: &dyn WorkbookSession, ctx: &ExecContext<'_>, name: &str) -> Result<Sheet> {
    match bounded("read_sheet", ctx.io_timeout, || session.read_sheet(name)) {
        Ok(Some(sheet)) => Ok(sheet),
        Ok(None) if name == ctx.default_sheet => Ok(Sheet::new(name)),
        Ok(None) => Err(SheetXError::EnvironmentChanged {
            sheet: name.to_string(),
            message: "sheet no longer exists".to_string(),
        }),
        Err(failure) => Err(executor_error(name, failure)),
    }
}

fn store_sheet(session: &mut dyn WorkbookSession, ctx: &ExecContext<'_>, sheet: &Sheet) -> Result<()> {
    bounded("write_sheet", ctx.io_timeout, || session.write_sheet(sheet))
        .map_err(|failure| executor_error(&sheet.name, failure))
}

fn load_names(session: &dyn WorkbookSession, ctx: &ExecContext<'_>, sheet: &str) -> Result<NamedRanges> {
    bounded("named_ranges", ctx.io_timeout, || session.named_ranges())
        .map_err(|failure| executor_error(sheet, failure))
}

fn store_names(session: &mut dyn WorkbookSession, ctx: &ExecContext<'_>, sheet: &str, names: &NamedRanges) -> Result<()> {
    bounded("write_named_ranges", ctx.io_timeout, || session.write_named_ranges(names))
        .map_err(|failure| executor_error(sheet, failure))
}

/// Map a session failure onto the executor error kinds
pub(crate) fn executor_error(sheet: &str, failure: IoFailure) -> SheetXError {
    match failure {
        IoFailure::Session(SessionError::Transient { message }) => SheetXError::TransientIo { message },
        IoFailure::Session(SessionError::Unsupported { message }) => SheetXError::Unsupported { message },
        IoFailure::Session(SessionError::SheetMissing { sheet }) => SheetXError::EnvironmentChanged {
            message: "sheet no longer exists".to_string(),
            sheet,
        },
        IoFailure::Session(SessionError::Unavailable { message }) => SheetXError::EnvironmentChanged {
            sheet: sheet.to_string(),
            message: format!("workbook unavailable: {}", message),
        },
        IoFailure::Timeout {
            op,
            elapsed_ms,
            limit_ms,
        } => SheetXError::Timeout {
            op,
            elapsed_ms,
            limit_ms,
        },
    }
}
