use super::{load_sheet, store_sheet, ExecContext};
use crate::errors::{Result, SheetXError};
use crate::model::{parse_column, parse_row, Axis, AxisAction};
use crate::session::WorkbookSession;

pub(super) fn column(
    session: &mut dyn WorkbookSession,
    ctx: &ExecContext<'_>,
    sheet_name: &str,
    column: &str,
    action: AxisAction,
    param: Option<f64>,
) -> Result<()> {
    let index = parse_column(column)?;
    apply(session, ctx, sheet_name, Axis::Column, index, action, param)
}

pub(super) fn row(
    session: &mut dyn WorkbookSession,
    ctx: &ExecContext<'_>,
    sheet_name: &str,
    row: u32,
    action: AxisAction,
    param: Option<f64>,
) -> Result<()> {
    let index = parse_row(row)?;
    apply(session, ctx, sheet_name, Axis::Row, index, action, param)
}

fn apply(
    session: &mut dyn WorkbookSession,
    ctx: &ExecContext<'_>,
    sheet_name: &str,
    axis: Axis,
    index: u32,
    action: AxisAction,
    param: Option<f64>,
) -> Result<()> {
    let mut sheet = load_sheet(session, ctx, sheet_name)?;

    match action {
        AxisAction::Resize => {
            let size = param.ok_or_else(|| SheetXError::Internal {
                message: "resize without a size reached the executor".to_string(),
            })?;
            sheet.resize(axis, index, size);
        }
        AxisAction::Insert => sheet.insert(axis, index, count(param)),
        AxisAction::Delete => {
            let count = count(param);
            if u64::from(index) + u64::from(count) > u64::from(sheet.extent(axis)) {
                return Err(SheetXError::EnvironmentChanged {
                    sheet: sheet_name.to_string(),
                    message: format!(
                        "cannot delete {} {:?} line(s) at {}; sheet extent is now {}",
                        count,
                        axis,
                        index + 1,
                        sheet.extent(axis)
                    ),
                });
            }
            sheet.delete(axis, index, count);
        }
    }
    store_sheet(session, ctx, &sheet)
}

fn count(param: Option<f64>) -> u32 {
    param.map(|n| n as u32).unwrap_or(1).max(1)
}
