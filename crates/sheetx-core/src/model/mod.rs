//! Workbook and operation data model

pub mod address;
pub mod batch;
pub mod cell;
pub mod operation;
pub mod sheet;
pub mod workbook;

pub use address::{col_to_letters, parse_column, parse_row, CellAddr, RangeRef};
pub use batch::{Batch, MetricTag, SequencedOperation};
pub use cell::{Cell, CellStyle, CellValue};
pub use operation::{AxisAction, CellInput, FormatKind, Operation};
pub use sheet::{Axis, Sheet};
pub use workbook::{ChangeRecord, NamedRange, NamedRanges, SheetShape, Workbook, WorkbookSchema};
