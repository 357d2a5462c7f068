//! Typed edit operations
//!
//! Operations arrive from the instruction source with their references
//! still as text. Parsing happens in validation so that a malformed
//! reference is reported per operation instead of failing the whole batch
//! at deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal supplied for a cell write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellInput {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for CellInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellInput::Number(n) => write!(f, "{}", n),
            CellInput::Bool(b) => write!(f, "{}", b),
            CellInput::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<f64> for CellInput {
    fn from(value: f64) -> Self {
        CellInput::Number(value)
    }
}

impl From<&str> for CellInput {
    fn from(value: &str) -> Self {
        CellInput::Text(value.to_string())
    }
}

/// Formatting applied by `FormatRange`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatKind {
    HeaderBold,
    Bold,
    Italic,
    Currency,
    Percent,
    NumberFormat { code: String },
}

pub const CURRENCY_FORMAT: &str = "$#,##0.00";
pub const PERCENT_FORMAT: &str = "0.00%";

impl FormatKind {
    /// Number format code this kind sets, if any
    pub fn number_format(&self) -> Option<&str> {
        match self {
            FormatKind::Currency => Some(CURRENCY_FORMAT),
            FormatKind::Percent => Some(PERCENT_FORMAT),
            FormatKind::NumberFormat { code } => Some(code),
            FormatKind::HeaderBold | FormatKind::Bold | FormatKind::Italic => None,
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatKind::HeaderBold => write!(f, "header-bold"),
            FormatKind::Bold => write!(f, "bold"),
            FormatKind::Italic => write!(f, "italic"),
            FormatKind::Currency => write!(f, "currency"),
            FormatKind::Percent => write!(f, "percent"),
            FormatKind::NumberFormat { code } => write!(f, "number-format {:?}", code),
        }
    }
}

/// Structural action on a column or row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisAction {
    /// Set width (columns) or height (rows) to `param`
    Resize,
    /// Insert `param` (default 1) empty lines before the target
    Insert,
    /// Delete `param` (default 1) lines starting at the target
    Delete,
}

impl fmt::Display for AxisAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AxisAction::Resize => "resize",
            AxisAction::Insert => "insert",
            AxisAction::Delete => "delete",
        })
    }
}

/// One edit operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    CellWrite {
        sheet: String,
        cell: String,
        value: CellInput,
    },
    FormulaWrite {
        sheet: String,
        cell: String,
        formula: String,
    },
    FormatRange {
        sheet: String,
        range: String,
        format: FormatKind,
    },
    ColumnOp {
        sheet: String,
        column: String,
        action: AxisAction,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        param: Option<f64>,
    },
    RowOp {
        sheet: String,
        row: u32,
        action: AxisAction,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        param: Option<f64>,
    },
    RangeCopy {
        sheet: String,
        src_range: String,
        dest_cell: String,
    },
    RangeClear {
        sheet: String,
        range: String,
    },
    NamedRangeCreate {
        name: String,
        sheet: String,
        range: String,
    },
}

impl Operation {
    /// Stable snake_case name of the variant
    pub fn kind_name(&self) -> &'static str {
        match self {
            Operation::CellWrite { .. } => "cell_write",
            Operation::FormulaWrite { .. } => "formula_write",
            Operation::FormatRange { .. } => "format_range",
            Operation::ColumnOp { .. } => "column_op",
            Operation::RowOp { .. } => "row_op",
            Operation::RangeCopy { .. } => "range_copy",
            Operation::RangeClear { .. } => "range_clear",
            Operation::NamedRangeCreate { .. } => "named_range_create",
        }
    }

    /// Sheet the operation reads or writes
    pub fn sheet(&self) -> &str {
        match self {
            Operation::CellWrite { sheet, .. }
            | Operation::FormulaWrite { sheet, .. }
            | Operation::FormatRange { sheet, .. }
            | Operation::ColumnOp { sheet, .. }
            | Operation::RowOp { sheet, .. }
            | Operation::RangeCopy { sheet, .. }
            | Operation::RangeClear { sheet, .. }
            | Operation::NamedRangeCreate { sheet, .. } => sheet,
        }
    }

    /// Textual target (cell, range, column, row or name)
    pub fn target(&self) -> String {
        match self {
            Operation::CellWrite { cell, .. } | Operation::FormulaWrite { cell, .. } => cell.clone(),
            Operation::FormatRange { range, .. } | Operation::RangeClear { range, .. } => {
                range.clone()
            }
            Operation::ColumnOp { column, .. } => column.clone(),
            Operation::RowOp { row, .. } => row.to_string(),
            Operation::RangeCopy {
                src_range,
                dest_cell,
                ..
            } => format!("{}->{}", src_range, dest_cell),
            Operation::NamedRangeCreate { name, .. } => name.clone(),
        }
    }

    /// Re-applying yields the same end state, so a transient failure may be
    /// retried in place
    pub fn is_idempotent(&self) -> bool {
        match self {
            Operation::FormatRange { .. } => true,
            Operation::ColumnOp { action, .. } | Operation::RowOp { action, .. } => {
                *action == AxisAction::Resize
            }
            Operation::CellWrite { .. }
            | Operation::FormulaWrite { .. }
            | Operation::RangeCopy { .. }
            | Operation::RangeClear { .. }
            | Operation::NamedRangeCreate { .. } => false,
        }
    }

    /// Wording for the review payload
    pub fn describe(&self) -> String {
        match self {
            Operation::CellWrite { sheet, cell, value } => {
                format!("write {} to {}!{}", value, sheet, cell)
            }
            Operation::FormulaWrite {
                sheet,
                cell,
                formula,
            } => format!("set formula {} in {}!{}", formula, sheet, cell),
            Operation::FormatRange {
                sheet,
                range,
                format,
            } => format!("format {}!{} as {}", sheet, range, format),
            Operation::ColumnOp {
                sheet,
                column,
                action,
                param,
            } => describe_axis(sheet, "column", column, *action, *param),
            Operation::RowOp {
                sheet,
                row,
                action,
                param,
            } => describe_axis(sheet, "row", &row.to_string(), *action, *param),
            Operation::RangeCopy {
                sheet,
                src_range,
                dest_cell,
            } => format!("copy {}!{} to {}", sheet, src_range, dest_cell),
            Operation::RangeClear { sheet, range } => format!("clear {}!{}", sheet, range),
            Operation::NamedRangeCreate { name, sheet, range } => {
                format!("name {}!{} as {}", sheet, range, name)
            }
        }
    }
}

fn describe_axis(sheet: &str, noun: &str, target: &str, action: AxisAction, param: Option<f64>) -> String {
    match (action, param) {
        (AxisAction::Resize, Some(size)) => format!("resize {} {} on {} to {}", noun, target, sheet, size),
        (AxisAction::Resize, None) => format!("resize {} {} on {}", noun, target, sheet),
        (action, Some(count)) => format!("{} {} x{} at {} on {}", action, noun, count, target, sheet),
        (action, None) => format!("{} {} {} on {}", action, noun, target, sheet),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_json_shape() {
        let op: Operation = serde_json::from_str(
            r#"{"kind":"format_range","sheet":"Sheet1","range":"A1:B1","format":"header-bold"}"#,
        )
        .unwrap();
        assert_eq!(
            op,
            Operation::FormatRange {
                sheet: "Sheet1".to_string(),
                range: "A1:B1".to_string(),
                format: FormatKind::HeaderBold,
            }
        );
    }

    #[test]
    fn test_cell_input_untagged() {
        let op: Operation =
            serde_json::from_str(r#"{"kind":"cell_write","sheet":"Sheet1","cell":"A1","value":100}"#)
                .unwrap();
        match op {
            Operation::CellWrite { value, .. } => assert_eq!(value, CellInput::Number(100.0)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_custom_number_format_json() {
        let format: FormatKind =
            serde_json::from_str(r#"{"number-format":{"code":"0.0x"}}"#).unwrap();
        assert_eq!(format.number_format(), Some("0.0x"));
    }

    #[test]
    fn test_idempotence_by_kind() {
        let resize = Operation::ColumnOp {
            sheet: "Sheet1".to_string(),
            column: "B".to_string(),
            action: AxisAction::Resize,
            param: Some(12.0),
        };
        let delete = Operation::ColumnOp {
            sheet: "Sheet1".to_string(),
            column: "B".to_string(),
            action: AxisAction::Delete,
            param: None,
        };
        assert!(resize.is_idempotent());
        assert!(!delete.is_idempotent());
    }
}
