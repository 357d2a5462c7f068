use super::{load_sheet, store_sheet, ExecContext};
use crate::errors::{Result, SheetXError};
use crate::model::{CellAddr, FormatKind, RangeRef};
use crate::session::WorkbookSession;

pub(super) fn format(
    session: &mut dyn WorkbookSession,
    ctx: &ExecContext<'_>,
    sheet_name: &str,
    range: &str,
    kind: &FormatKind,
) -> Result<()> {
    let range: RangeRef = range.parse()?;
    let mut sheet = load_sheet(session, ctx, sheet_name)?;

    for addr in range.cells() {
        let style = &mut sheet.cell_mut(addr).style;
        match kind {
            FormatKind::HeaderBold | FormatKind::Bold => style.bold = true,
            FormatKind::Italic => style.italic = true,
            FormatKind::Currency | FormatKind::Percent | FormatKind::NumberFormat { .. } => {
                style.number_format = kind.number_format().map(str::to_string);
            }
        }
    }
    store_sheet(session, ctx, &sheet)
}

/// Copy values, formulas and styles; formulas are copied as text
pub(super) fn copy(
    session: &mut dyn WorkbookSession,
    ctx: &ExecContext<'_>,
    sheet_name: &str,
    src_range: &str,
    dest_cell: &str,
) -> Result<()> {
    let src: RangeRef = src_range.parse()?;
    let dest: CellAddr = dest_cell.parse()?;
    let mut sheet = load_sheet(session, ctx, sheet_name)?;

    // buffer first so overlapping ranges copy the pre-copy source
    let block = sheet.read_block(src);
    for (row_off, col_off, cell) in block {
        let target = dest
            .offset(row_off, col_off)
            .ok_or_else(|| SheetXError::EnvironmentChanged {
                sheet: sheet_name.to_string(),
                message: format!("copy to {} runs past the grid edge", dest_cell),
            })?;
        match cell {
            Some(cell) => *sheet.cell_mut(target) = cell,
            None => {
                sheet.cells.remove(&target);
                sheet.extend_to(target);
            }
        }
    }
    store_sheet(session, ctx, &sheet)
}

/// Clear values and formulas; formatting stays
pub(super) fn clear(session: &mut dyn WorkbookSession, ctx: &ExecContext<'_>, sheet_name: &str, range: &str) -> Result<()> {
    let range: RangeRef = range.parse()?;
    let mut sheet = load_sheet(session, ctx, sheet_name)?;
    sheet.clear_range(range);
    store_sheet(session, ctx, &sheet)
}
