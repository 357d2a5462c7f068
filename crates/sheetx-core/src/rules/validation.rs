use crate::config::{ApplierConfig, GRID_MAX_COLS, GRID_MAX_ROWS};
use crate::errors::{Result, SheetXError};
use crate::model::{
    parse_column, parse_row, Axis, AxisAction, CellAddr, CellInput, FormatKind, NamedRange, Operation,
    RangeRef, SequencedOperation, SheetShape, WorkbookSchema,
};
use crate::model::cell::is_numeric_format;
use crate::report::ValidationResult;
use crate::rules::syntax::{check_formula, check_name};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Checks operations against the workbook schema without side effects
///
/// Batch validation walks operations in index order and projects each
/// valid operation's effect on the schema (default sheet creation, grown
/// extents, numeric formats, new names) so later operations are judged
/// against the state they will actually meet.
#[derive(Debug, Clone)]
pub struct OperationValidator {
    default_sheet: String,
    auto_extend_rows: u32,
    auto_extend_cols: u32,
    max_column_width: f64,
    max_row_height: f64,
}

impl OperationValidator {
    pub fn new(config: &ApplierConfig) -> Self {
        Self {
            default_sheet: config.default_sheet.clone(),
            auto_extend_rows: config.auto_extend_rows,
            auto_extend_cols: config.auto_extend_cols,
            max_column_width: config.max_column_width,
            max_row_height: config.max_row_height,
        }
    }

    /// Validate one operation on its own
    pub fn validate(&self, op: &SequencedOperation, schema: &WorkbookSchema) -> ValidationResult {
        let mut projection = Projection::new(schema);
        self.check(op, &mut projection)
    }

    /// Validate every operation, collecting all defects
    ///
    /// Results come back in index order. Operations sharing an index are
    /// all reported invalid.
    pub fn validate_batch(&self, ops: &[&SequencedOperation], schema: &WorkbookSchema) -> Vec<ValidationResult> {
        let mut seen: HashMap<u32, usize> = HashMap::new();
        for op in ops {
            *seen.entry(op.index).or_insert(0) += 1;
        }

        let mut projection = Projection::new(schema);
        ops.iter()
            .map(|op| {
                if seen.get(&op.index).copied().unwrap_or(0) > 1 {
                    return ValidationResult::rejected(
                        op.index,
                        &SheetXError::DuplicateOperationIndex { index: op.index },
                    );
                }
                self.check(op, &mut projection)
            })
            .collect()
    }

    fn check(&self, op: &SequencedOperation, projection: &mut Projection) -> ValidationResult {
        match self.check_operation(&op.operation, projection) {
            Ok(()) => ValidationResult::ok(op.index),
            Err(err) => ValidationResult::rejected(op.index, &err),
        }
    }

    fn check_operation(&self, op: &Operation, projection: &mut Projection) -> Result<()> {
        let sheet_name = op.sheet();
        let shape = self.resolve_sheet(sheet_name, projection)?;

        match op {
            Operation::CellWrite { cell, value, .. } => {
                let addr = self.cell_in_bounds(sheet_name, cell, &shape)?;
                self.check_value(sheet_name, cell, addr, value, projection)?;
                projection.touch(sheet_name, addr);
            }
            Operation::FormulaWrite { cell, formula, .. } => {
                let addr = self.cell_in_bounds(sheet_name, cell, &shape)?;
                check_formula(formula)?;
                projection.touch(sheet_name, addr);
            }
            Operation::FormatRange { range, format, .. } => {
                let range = self.range_in_bounds(sheet_name, range, &shape)?;
                if let FormatKind::NumberFormat { code } = format {
                    if code.trim().is_empty() {
                        return Err(SheetXError::InvalidFormat {
                            reason: "number format code is empty".to_string(),
                        });
                    }
                }
                if format.number_format().is_some_and(is_numeric_format) {
                    projection.mark_numeric(sheet_name, range);
                }
                projection.touch(sheet_name, range.end);
            }
            Operation::ColumnOp {
                column,
                action,
                param,
                ..
            } => {
                let col = parse_column(column)?;
                self.check_axis(sheet_name, column, col, &shape, Axis::Column, *action, *param)?;
                projection.apply_axis(sheet_name, Axis::Column, col, *action, *param);
            }
            Operation::RowOp {
                row, action, param, ..
            } => {
                let index = parse_row(*row)?;
                self.check_axis(sheet_name, &row.to_string(), index, &shape, Axis::Row, *action, *param)?;
                projection.apply_axis(sheet_name, Axis::Row, index, *action, *param);
            }
            Operation::RangeCopy {
                src_range,
                dest_cell,
                ..
            } => {
                let src = self.range_in_bounds(sheet_name, src_range, &shape)?;
                let dest = self.cell_in_bounds(sheet_name, dest_cell, &shape)?;
                let dest_end = dest
                    .offset(src.rows() - 1, src.cols() - 1)
                    .ok_or_else(|| self.out_of_bounds(sheet_name, dest_cell, &shape))?;
                self.check_bounds(sheet_name, &dest_end.to_string(), dest_end, &shape)?;
                projection.touch(sheet_name, dest_end);
            }
            Operation::RangeClear { range, .. } => {
                self.range_in_bounds(sheet_name, range, &shape)?;
            }
            Operation::NamedRangeCreate { name, range, .. } => {
                check_name(name)?;
                if projection.names.contains(&NamedRange::key(name)) {
                    return Err(SheetXError::DuplicateNamedRange { name: name.clone() });
                }
                self.range_in_bounds(sheet_name, range, &shape)?;
                projection.names.insert(NamedRange::key(name));
            }
        }
        Ok(())
    }

    fn resolve_sheet(&self, name: &str, projection: &mut Projection) -> Result<SheetShape> {
        match projection.sheets.get(name) {
            Some(shape) => Ok(shape.clone()),
            None if name == self.default_sheet => {
                let shape = SheetShape::default();
                projection.sheets.insert(name.to_string(), shape.clone());
                Ok(shape)
            }
            None => Err(SheetXError::SheetNotFound {
                sheet: name.to_string(),
            }),
        }
    }

    fn check_value(
        &self,
        sheet: &str,
        cell: &str,
        addr: CellAddr,
        value: &CellInput,
        projection: &Projection,
    ) -> Result<()> {
        if let CellInput::Number(n) = value {
            if !n.is_finite() {
                return Err(SheetXError::NonFiniteNumber {
                    cell: cell.to_string(),
                });
            }
        }
        if !projection.is_numeric(sheet, addr) {
            return Ok(());
        }
        let numeric = match value {
            CellInput::Number(_) => true,
            CellInput::Text(text) => text.trim().parse::<f64>().is_ok_and(f64::is_finite),
            CellInput::Bool(_) => false,
        };
        if numeric {
            Ok(())
        } else {
            Err(SheetXError::NonNumericValue {
                sheet: sheet.to_string(),
                cell: cell.to_string(),
                value: value.to_string(),
            })
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_axis(
        &self,
        sheet: &str,
        label: &str,
        index: u32,
        shape: &SheetShape,
        axis: Axis,
        action: AxisAction,
        param: Option<f64>,
    ) -> Result<()> {
        let (extent, margin, grid_max, max_size) = match axis {
            Axis::Row => (shape.rows, self.auto_extend_rows, GRID_MAX_ROWS, self.max_row_height),
            Axis::Column => (shape.cols, self.auto_extend_cols, GRID_MAX_COLS, self.max_column_width),
        };
        let invalid = |reason: String| SheetXError::InvalidAxisParam {
            action: action.to_string(),
            reason,
        };
        let reachable = index < self.limit(extent, margin, grid_max);

        match action {
            AxisAction::Resize => {
                let size = param.ok_or_else(|| invalid("resize needs a size".to_string()))?;
                if !size.is_finite() || size < 0.0 || size > max_size {
                    return Err(invalid(format!("size {} not in [0, {}]", size, max_size)));
                }
                if !reachable {
                    return Err(self.out_of_bounds(sheet, label, shape));
                }
            }
            AxisAction::Insert => {
                let count = count_param(param).map_err(invalid)?;
                if !reachable {
                    return Err(self.out_of_bounds(sheet, label, shape));
                }
                if u64::from(extent.max(index)) + u64::from(count) > u64::from(grid_max) {
                    return Err(invalid(format!("inserting {} would pass the grid edge", count)));
                }
            }
            AxisAction::Delete => {
                let count = count_param(param).map_err(invalid)?;
                if u64::from(index) + u64::from(count) > u64::from(extent) {
                    return Err(self.out_of_bounds(sheet, label, shape));
                }
            }
        }
        Ok(())
    }

    fn cell_in_bounds(&self, sheet: &str, cell: &str, shape: &SheetShape) -> Result<CellAddr> {
        let addr: CellAddr = cell.parse()?;
        self.check_bounds(sheet, cell, addr, shape)?;
        Ok(addr)
    }

    fn range_in_bounds(&self, sheet: &str, range: &str, shape: &SheetShape) -> Result<RangeRef> {
        let parsed: RangeRef = range.parse()?;
        self.check_bounds(sheet, range, parsed.end, shape)?;
        Ok(parsed)
    }

    fn check_bounds(&self, sheet: &str, reference: &str, addr: CellAddr, shape: &SheetShape) -> Result<()> {
        let max_rows = self.limit(shape.rows, self.auto_extend_rows, GRID_MAX_ROWS);
        let max_cols = self.limit(shape.cols, self.auto_extend_cols, GRID_MAX_COLS);
        if addr.row >= max_rows || addr.col >= max_cols {
            return Err(self.out_of_bounds(sheet, reference, shape));
        }
        Ok(())
    }

    fn out_of_bounds(&self, sheet: &str, reference: &str, shape: &SheetShape) -> SheetXError {
        SheetXError::OutOfBounds {
            sheet: sheet.to_string(),
            reference: reference.to_string(),
            max_rows: self.limit(shape.rows, self.auto_extend_rows, GRID_MAX_ROWS),
            max_cols: self.limit(shape.cols, self.auto_extend_cols, GRID_MAX_COLS),
        }
    }

    fn limit(&self, extent: u32, margin: u32, grid_max: u32) -> u32 {
        extent.saturating_add(margin).min(grid_max)
    }
}

/// Line count for insert/delete; absent means one
fn count_param(param: Option<f64>) -> std::result::Result<u32, String> {
    match param {
        None => Ok(1),
        Some(n) if n.is_finite() && n >= 1.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => {
            Ok(n as u32)
        }
        Some(n) => Err(format!("count {} is not a positive integer", n)),
    }
}

/// Schema as it will look after the operations validated so far
struct Projection {
    sheets: BTreeMap<String, SheetShape>,
    numeric_ranges: BTreeMap<String, Vec<RangeRef>>,
    names: BTreeSet<String>,
}

impl Projection {
    fn new(schema: &WorkbookSchema) -> Self {
        Self {
            sheets: schema.sheets.clone(),
            numeric_ranges: BTreeMap::new(),
            names: schema.named_ranges.clone(),
        }
    }

    /// Grow the sheet extent to cover `end`
    fn touch(&mut self, sheet: &str, end: CellAddr) {
        if let Some(shape) = self.sheets.get_mut(sheet) {
            shape.rows = shape.rows.max(end.row + 1);
            shape.cols = shape.cols.max(end.col + 1);
        }
    }

    fn mark_numeric(&mut self, sheet: &str, range: RangeRef) {
        self.numeric_ranges
            .entry(sheet.to_string())
            .or_default()
            .push(range);
    }

    fn is_numeric(&self, sheet: &str, addr: CellAddr) -> bool {
        self.sheets
            .get(sheet)
            .is_some_and(|s| s.numeric_cells.contains(&addr))
            || self
                .numeric_ranges
                .get(sheet)
                .is_some_and(|ranges| ranges.iter().any(|r| r.contains(addr)))
    }

    /// Mirror a structural insert or delete: the extent moves and numeric
    /// formats travel with their cells, dropping those in a deleted band.
    fn apply_axis(&mut self, sheet: &str, axis: Axis, index: u32, action: AxisAction, param: Option<f64>) {
        let insert = match action {
            AxisAction::Resize => return,
            AxisAction::Insert => true,
            AxisAction::Delete => false,
        };
        let count = count_param(param).unwrap_or(1);

        if let Some(shape) = self.sheets.get_mut(sheet) {
            let extent = match axis {
                Axis::Row => &mut shape.rows,
                Axis::Column => &mut shape.cols,
            };
            if insert {
                if index < *extent {
                    *extent = extent.saturating_add(count);
                }
            } else {
                let end = index.saturating_add(count);
                *extent = extent.saturating_sub(end.min(*extent).saturating_sub(index));
            }

            shape.numeric_cells = std::mem::take(&mut shape.numeric_cells)
                .into_iter()
                .filter_map(|addr| {
                    shift_line(axis.index_of(addr), index, count, insert).map(|i| axis.with_index(addr, i))
                })
                .collect();
        }

        if let Some(ranges) = self.numeric_ranges.get_mut(sheet) {
            *ranges = std::mem::take(ranges)
                .into_iter()
                .flat_map(|range| shift_range(range, axis, index, count, insert))
                .collect();
        }
    }
}

/// New position of line `i` after inserting or deleting `count` lines at
/// `at`; `None` when the line itself is deleted
fn shift_line(i: u32, at: u32, count: u32, insert: bool) -> Option<u32> {
    let end = at.saturating_add(count);
    match (insert, i) {
        (_, i) if i < at => Some(i),
        (true, i) => Some(i.saturating_add(count)),
        (false, i) if i < end => None,
        (false, i) => Some(i - count),
    }
}

/// Pieces of `range` left after an insert or delete along `axis`
///
/// An insert inside the range splits it around the new blank lines; a
/// delete keeps the parts before and after the removed band.
fn shift_range(range: RangeRef, axis: Axis, at: u32, count: u32, insert: bool) -> Vec<RangeRef> {
    let lo = axis.index_of(range.start);
    let hi = axis.index_of(range.end);
    let end = at.saturating_add(count);

    let bands: Vec<(u32, u32)> = if insert {
        if hi < at {
            vec![(lo, hi)]
        } else if lo >= at {
            vec![(lo.saturating_add(count), hi.saturating_add(count))]
        } else {
            vec![(lo, at - 1), (end, hi.saturating_add(count))]
        }
    } else {
        let mut kept = Vec::new();
        if lo < at {
            kept.push((lo, hi.min(at - 1)));
        }
        if hi >= end {
            kept.push((lo.max(end) - count, hi - count));
        }
        kept
    };

    bands
        .into_iter()
        .map(|(from, to)| RangeRef {
            start: axis.with_index(range.start, from),
            end: axis.with_index(range.end, to),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Sheet, Workbook};

    fn schema() -> WorkbookSchema {
        let mut wb = Workbook::new("wb", "Sheet1");
        wb.sheets.insert("Sheet1".to_string(), Sheet::with_dims("Sheet1", 10, 5));
        wb.schema()
    }

    fn seq(index: u32, operation: Operation) -> SequencedOperation {
        SequencedOperation {
            index,
            operation,
            metric: None,
        }
    }

    fn write(cell: &str, value: CellInput) -> Operation {
        Operation::CellWrite {
            sheet: "Sheet1".to_string(),
            cell: cell.to_string(),
            value,
        }
    }

    fn validator() -> OperationValidator {
        OperationValidator::new(&ApplierConfig::default())
    }

    #[test]
    fn test_write_within_margin() {
        let result = validator().validate(&seq(0, write("Z1010", 1.0.into())), &schema());
        assert!(result.valid, "{:?}", result.reason);
    }

    #[test]
    fn test_write_past_margin() {
        let result = validator().validate(&seq(0, write("ZZ99999", "x".into())), &schema());
        assert!(!result.valid);
        assert_eq!(result.code.as_deref(), Some("ERR_OUT_OF_BOUNDS"));
    }

    #[test]
    fn test_unknown_sheet_vs_default_sheet() {
        let op = |sheet: &str| Operation::RangeClear {
            sheet: sheet.to_string(),
            range: "A1".to_string(),
        };
        let schema = Workbook::new("wb", "Data").schema();

        assert!(validator().validate(&seq(0, op("Sheet1")), &schema).valid);
        let missing = validator().validate(&seq(0, op("Forecast")), &schema);
        assert_eq!(missing.code.as_deref(), Some("ERR_SHEET_NOT_FOUND"));
    }

    #[test]
    fn test_collects_every_defect() {
        let a = seq(0, write("A1", 1.0.into()));
        let b = seq(1, write("1A", 1.0.into()));
        let c = seq(
            2,
            Operation::FormulaWrite {
                sheet: "Sheet1".to_string(),
                cell: "B2".to_string(),
                formula: "=SUM(A1".to_string(),
            },
        );
        let results = validator().validate_batch(&[&a, &b, &c], &schema());
        let valid: Vec<bool> = results.iter().map(|r| r.valid).collect();
        assert_eq!(valid, vec![true, false, false]);
    }

    #[test]
    fn test_numeric_format_earlier_in_batch() {
        let format = seq(
            0,
            Operation::FormatRange {
                sheet: "Sheet1".to_string(),
                range: "B1:B5".to_string(),
                format: FormatKind::Currency,
            },
        );
        let good = seq(1, write("B2", "1250.5".into()));
        let bad = seq(2, write("B3", "n/a".into()));
        let outside = seq(3, write("C3", "n/a".into()));

        let results = validator().validate_batch(&[&format, &good, &bad, &outside], &schema());
        assert!(results[1].valid);
        assert_eq!(results[2].code.as_deref(), Some("ERR_INVALID_VALUE"));
        assert!(results[3].valid);
    }

    #[test]
    fn test_non_finite_number_rejected() {
        let result = validator().validate(&seq(0, write("A1", f64::NAN.into())), &schema());
        assert_eq!(result.code.as_deref(), Some("ERR_INVALID_VALUE"));
    }

    #[test]
    fn test_column_resize_params() {
        let op = |param| Operation::ColumnOp {
            sheet: "Sheet1".to_string(),
            column: "B".to_string(),
            action: AxisAction::Resize,
            param,
        };
        let v = validator();
        assert!(v.validate(&seq(0, op(Some(0.0))), &schema()).valid);
        assert!(v.validate(&seq(0, op(Some(18.5))), &schema()).valid);
        assert!(!v.validate(&seq(0, op(Some(-1.0))), &schema()).valid);
        assert!(!v.validate(&seq(0, op(Some(300.0))), &schema()).valid);
        assert!(!v.validate(&seq(0, op(None)), &schema()).valid);
    }

    #[test]
    fn test_delete_must_hit_existing_lines() {
        let op = |column: &str, param| Operation::ColumnOp {
            sheet: "Sheet1".to_string(),
            column: column.to_string(),
            action: AxisAction::Delete,
            param,
        };
        let v = validator();
        assert!(v.validate(&seq(0, op("E", None)), &schema()).valid);
        assert!(!v.validate(&seq(0, op("F", None)), &schema()).valid);
        assert!(!v.validate(&seq(0, op("D", Some(3.0))), &schema()).valid);
        assert!(!v.validate(&seq(0, op("A", Some(1.5))), &schema()).valid);
    }

    #[test]
    fn test_row_zero_rejected() {
        let op = Operation::RowOp {
            sheet: "Sheet1".to_string(),
            row: 0,
            action: AxisAction::Insert,
            param: None,
        };
        let result = validator().validate(&seq(0, op), &schema());
        assert_eq!(result.code.as_deref(), Some("ERR_INVALID_REFERENCE"));
    }

    #[test]
    fn test_named_range_unique_within_batch() {
        let create = |index, name: &str| {
            seq(
                index,
                Operation::NamedRangeCreate {
                    name: name.to_string(),
                    sheet: "Sheet1".to_string(),
                    range: "A1:A5".to_string(),
                },
            )
        };
        let a = create(0, "Revenue");
        let b = create(1, "REVENUE");
        let c = create(2, "Null");
        let results = validator().validate_batch(&[&a, &b, &c], &schema());
        assert!(results[0].valid);
        assert_eq!(results[1].code.as_deref(), Some("ERR_ALREADY_EXISTS"));
        assert_eq!(results[2].code.as_deref(), Some("ERR_INVALID_NAME"));
    }

    #[test]
    fn test_copy_destination_must_fit() {
        let op = |dest: &str| Operation::RangeCopy {
            sheet: "Sheet1".to_string(),
            src_range: "A1:C3".to_string(),
            dest_cell: dest.to_string(),
        };
        assert!(validator().validate(&seq(0, op("D1")), &schema()).valid);
        assert!(!validator().validate(&seq(0, op("AE1")), &schema()).valid);
    }

    fn axis_op(action: AxisAction, param: Option<f64>, column: &str) -> Operation {
        Operation::ColumnOp {
            sheet: "Sheet1".to_string(),
            column: column.to_string(),
            action,
            param,
        }
    }

    fn formatted_schema() -> WorkbookSchema {
        let mut wb = Workbook::new("wb", "Sheet1");
        let mut sheet = Sheet::with_dims("Sheet1", 10, 5);
        sheet.cell_mut("B2".parse().unwrap()).style.number_format = Some("$#,##0.00".to_string());
        wb.sheets.insert("Sheet1".to_string(), sheet);
        wb.schema()
    }

    #[test]
    fn test_numeric_cells_follow_column_delete() {
        // Given: B2 carries a currency format; deleting column A moves it to A2
        let delete = seq(0, axis_op(AxisAction::Delete, None, "A"));
        let moved = seq(1, write("A2", "n/a".into()));
        let vacated = seq(2, write("B2", "n/a".into()));

        let results = validator().validate_batch(&[&delete, &moved, &vacated], &formatted_schema());

        assert!(results[0].valid);
        assert_eq!(results[1].code.as_deref(), Some("ERR_INVALID_VALUE"));
        assert!(results[2].valid, "{:?}", results[2].reason);
    }

    #[test]
    fn test_numeric_cells_dropped_with_deleted_column() {
        let delete = seq(0, axis_op(AxisAction::Delete, None, "B"));
        let write_b2 = seq(1, write("B2", "n/a".into()));

        let results = validator().validate_batch(&[&delete, &write_b2], &formatted_schema());

        assert!(results[1].valid, "{:?}", results[1].reason);
    }

    #[test]
    fn test_numeric_cells_follow_column_insert() {
        let insert = seq(0, axis_op(AxisAction::Insert, Some(2.0), "A"));
        let moved = seq(1, write("D2", "n/a".into()));
        let vacated = seq(2, write("B2", "n/a".into()));

        let results = validator().validate_batch(&[&insert, &moved, &vacated], &formatted_schema());

        assert_eq!(results[1].code.as_deref(), Some("ERR_INVALID_VALUE"));
        assert!(results[2].valid, "{:?}", results[2].reason);
    }

    #[test]
    fn test_batch_formats_follow_row_insert_and_delete() {
        // Given: B1:B5 becomes numeric earlier in the batch
        let format = seq(
            0,
            Operation::FormatRange {
                sheet: "Sheet1".to_string(),
                range: "B1:B5".to_string(),
                format: FormatKind::Percent,
            },
        );
        let row_op = |index, action, row| {
            seq(
                index,
                Operation::RowOp {
                    sheet: "Sheet1".to_string(),
                    row,
                    action,
                    param: None,
                },
            )
        };
        // When: a row is inserted at 3 (B3:B5 move to B4:B6, B3 is blank)
        let insert = row_op(1, AxisAction::Insert, 3);
        let blank = seq(2, write("B3", "n/a".into()));
        let shifted = seq(3, write("B6", "n/a".into()));
        // And: row 1 is deleted (B1 goes, B2 becomes B1, blank B3 becomes B2)
        let delete = row_op(4, AxisAction::Delete, 1);
        let top = seq(5, write("B1", "n/a".into()));
        let was_blank = seq(6, write("B2", "n/a".into()));
        let tail = seq(7, write("B5", "n/a".into()));
        let past_tail = seq(8, write("B6", "n/a".into()));

        let results = validator().validate_batch(
            &[&format, &insert, &blank, &shifted, &delete, &top, &was_blank, &tail, &past_tail],
            &schema(),
        );

        let valid: Vec<bool> = results.iter().map(|r| r.valid).collect();
        assert_eq!(valid, vec![true, true, true, false, true, false, true, false, true]);
    }

    #[test]
    fn test_shift_range_pieces() {
        let r = |s: &str| -> RangeRef { s.parse().unwrap() };
        let range = r("A2:A6");

        assert_eq!(shift_range(range, Axis::Row, 3, 2, true), vec![r("A2:A3"), r("A6:A8")]);
        assert_eq!(shift_range(range, Axis::Row, 2, 2, false), vec![r("A2:A2"), r("A3:A4")]);

        assert!(shift_range(range, Axis::Row, 1, 5, false).is_empty());
        assert_eq!(shift_line(7, 2, 3, false), Some(4));
        assert_eq!(shift_line(3, 2, 3, false), None);
    }

    #[test]
    fn test_duplicate_indices_all_rejected() {
        let a = seq(1, write("A1", 1.0.into()));
        let b = seq(1, write("A2", 2.0.into()));
        let results = validator().validate_batch(&[&a, &b], &schema());
        assert!(results.iter().all(|r| r.code.as_deref() == Some("ERR_DUPLICATE_INDEX")));
    }
}
