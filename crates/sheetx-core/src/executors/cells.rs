use super::{load_sheet, store_sheet, ExecContext};
use crate::errors::Result;
use crate::model::{CellAddr, CellInput, CellValue};
use crate::session::WorkbookSession;

pub(super) fn write_value(
    session: &mut dyn WorkbookSession,
    ctx: &ExecContext<'_>,
    sheet_name: &str,
    cell: &str,
    input: &CellInput,
) -> Result<()> {
    let addr: CellAddr = cell.parse()?;
    let mut sheet = load_sheet(session, ctx, sheet_name)?;

    let numeric_target = sheet.cell(addr).is_some_and(|c| c.style.is_numeric());
    let value = match input {
        CellInput::Number(n) => CellValue::Number(*n),
        CellInput::Bool(b) => CellValue::Bool(*b),
        CellInput::Text(text) if numeric_target => match text.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(text.clone()),
        },
        CellInput::Text(text) => CellValue::Text(text.clone()),
    };

    sheet.set_value(addr, value);
    store_sheet(session, ctx, &sheet)
}

/// Store formula text verbatim; nothing is evaluated
pub(super) fn write_formula(
    session: &mut dyn WorkbookSession,
    ctx: &ExecContext<'_>,
    sheet_name: &str,
    cell: &str,
    formula: &str,
) -> Result<()> {
    let addr: CellAddr = cell.parse()?;
    let mut sheet = load_sheet(session, ctx, sheet_name)?;
    sheet.set_formula(addr, formula);
    store_sheet(session, ctx, &sheet)
}
