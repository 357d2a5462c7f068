use super::{load_names, load_sheet, store_names, ExecContext};
use crate::errors::{Result, SheetXError};
use crate::model::NamedRange;
use crate::session::WorkbookSession;

pub(super) fn create(
    session: &mut dyn WorkbookSession,
    ctx: &ExecContext<'_>,
    name: &str,
    sheet_name: &str,
    range: &str,
) -> Result<()> {
    // only checks the sheet still exists
    load_sheet(session, ctx, sheet_name)?;

    let mut names = load_names(session, ctx, sheet_name)?;
    let key = NamedRange::key(name);
    if names.contains_key(&key) {
        return Err(SheetXError::EnvironmentChanged {
            sheet: sheet_name.to_string(),
            message: format!("named range {} was created by someone else", name),
        });
    }
    names.insert(
        key,
        NamedRange {
            name: name.to_string(),
            sheet: sheet_name.to_string(),
            range: range.to_string(),
        },
    );
    store_names(session, ctx, sheet_name, &names)
}
