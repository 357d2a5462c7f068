use crate::model::address::{CellAddr, RangeRef};
use crate::model::cell::{Cell, CellValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Row or column axis for structural edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    pub(crate) fn index_of(self, addr: CellAddr) -> u32 {
        match self {
            Axis::Row => addr.row,
            Axis::Column => addr.col,
        }
    }

    pub(crate) fn with_index(self, addr: CellAddr, index: u32) -> CellAddr {
        match self {
            Axis::Row => CellAddr::new(index, addr.col),
            Axis::Column => CellAddr::new(addr.row, index),
        }
    }
}

/// One worksheet: sparse cells plus its current used dimensions
///
/// `rows`/`cols` are the sheet's logical extent. Writes inside the
/// auto-extend margin grow it; structural inserts and deletes move it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: u32,
    pub cols: u32,
    #[serde(default)]
    pub cells: BTreeMap<CellAddr, Cell>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub column_widths: BTreeMap<u32, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub row_heights: BTreeMap<u32, f64>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: 0,
            cols: 0,
            cells: BTreeMap::new(),
            column_widths: BTreeMap::new(),
            row_heights: BTreeMap::new(),
        }
    }

    /// Sheet pre-sized to `rows` x `cols`
    pub fn with_dims(name: impl Into<String>, rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            ..Self::new(name)
        }
    }

    pub fn cell(&self, addr: CellAddr) -> Option<&Cell> {
        self.cells.get(&addr)
    }

    pub fn value(&self, addr: CellAddr) -> CellValue {
        self.cells
            .get(&addr)
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    /// Mutable cell, created and covered by the extent if missing
    pub fn cell_mut(&mut self, addr: CellAddr) -> &mut Cell {
        self.extend_to(addr);
        self.cells.entry(addr).or_default()
    }

    pub fn extend_to(&mut self, addr: CellAddr) {
        self.rows = self.rows.max(addr.row + 1);
        self.cols = self.cols.max(addr.col + 1);
    }

    /// Write a literal, dropping any formula
    pub fn set_value(&mut self, addr: CellAddr, value: CellValue) {
        let cell = self.cell_mut(addr);
        cell.value = value;
        cell.formula = None;
        self.prune(addr);
    }

    /// Write formula text, dropping any cached literal
    pub fn set_formula(&mut self, addr: CellAddr, formula: impl Into<String>) {
        let cell = self.cell_mut(addr);
        cell.formula = Some(formula.into());
        cell.value = CellValue::Empty;
    }

    /// Clear contents of every cell in `range`; styles stay
    pub fn clear_range(&mut self, range: RangeRef) {
        for addr in range.cells() {
            if let Some(cell) = self.cells.get_mut(&addr) {
                cell.value = CellValue::Empty;
                cell.formula = None;
                self.prune(addr);
            }
        }
    }

    /// Cells of `range` keyed by their offset from the range origin
    pub fn read_block(&self, range: RangeRef) -> Vec<(u32, u32, Option<Cell>)> {
        range
            .cells()
            .map(|addr| {
                (
                    addr.row - range.start.row,
                    addr.col - range.start.col,
                    self.cells.get(&addr).cloned(),
                )
            })
            .collect()
    }

    /// Insert `count` empty rows or columns before `at`
    pub fn insert(&mut self, axis: Axis, at: u32, count: u32) {
        self.cells = std::mem::take(&mut self.cells)
            .into_iter()
            .map(|(addr, cell)| {
                let i = axis.index_of(addr);
                let moved = if i >= at {
                    axis.with_index(addr, i.saturating_add(count))
                } else {
                    addr
                };
                (moved, cell)
            })
            .collect();
        shift_sizes(self.sizes_mut(axis), at, count, true);
        let extent = self.extent_mut(axis);
        if at < *extent {
            *extent = extent.saturating_add(count);
        }
    }

    /// Delete `count` rows or columns starting at `at`
    pub fn delete(&mut self, axis: Axis, at: u32, count: u32) {
        let end = at.saturating_add(count);
        self.cells = std::mem::take(&mut self.cells)
            .into_iter()
            .filter_map(|(addr, cell)| {
                let i = axis.index_of(addr);
                if i < at {
                    Some((addr, cell))
                } else if i < end {
                    None
                } else {
                    Some((axis.with_index(addr, i - count), cell))
                }
            })
            .collect();
        shift_sizes(self.sizes_mut(axis), at, count, false);
        let extent = self.extent_mut(axis);
        *extent = extent.saturating_sub(end.min(*extent).saturating_sub(at));
    }

    /// Set a column width or row height
    pub fn resize(&mut self, axis: Axis, index: u32, size: f64) {
        self.sizes_mut(axis).insert(index, size);
    }

    pub fn extent(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Row => self.rows,
            Axis::Column => self.cols,
        }
    }

    fn extent_mut(&mut self, axis: Axis) -> &mut u32 {
        match axis {
            Axis::Row => &mut self.rows,
            Axis::Column => &mut self.cols,
        }
    }

    fn sizes_mut(&mut self, axis: Axis) -> &mut BTreeMap<u32, f64> {
        match axis {
            Axis::Row => &mut self.row_heights,
            Axis::Column => &mut self.column_widths,
        }
    }

    fn prune(&mut self, addr: CellAddr) {
        if self.cells.get(&addr).is_some_and(Cell::is_blank) {
            self.cells.remove(&addr);
        }
    }
}

fn shift_sizes(sizes: &mut BTreeMap<u32, f64>, at: u32, count: u32, insert: bool) {
    let end = at.saturating_add(count);
    *sizes = std::mem::take(sizes)
        .into_iter()
        .filter_map(|(i, size)| match (insert, i) {
            (_, i) if i < at => Some((i, size)),
            (true, i) => Some((i.saturating_add(count), size)),
            (false, i) if i < end => None,
            (false, i) => Some((i - count, size)),
        })
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> CellAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_set_value_extends_dims() {
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_value(addr("C5"), CellValue::Number(1.0));
        assert_eq!((sheet.rows, sheet.cols), (5, 3));
    }

    #[test]
    fn test_formula_replaces_value() {
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_value(addr("A1"), CellValue::Number(3.0));
        sheet.set_formula(addr("A1"), "=B1*2");

        let cell = sheet.cell(addr("A1")).unwrap();
        assert_eq!(cell.formula.as_deref(), Some("=B1*2"));
        assert_eq!(cell.value, CellValue::Empty);
    }

    #[test]
    fn test_clear_keeps_style() {
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_value(addr("A1"), CellValue::Text("x".into()));
        sheet.cell_mut(addr("A1")).style.bold = true;
        sheet.set_value(addr("A2"), CellValue::Text("y".into()));

        sheet.clear_range("A1:A2".parse().unwrap());

        assert!(sheet.cell(addr("A1")).unwrap().style.bold);
        assert_eq!(sheet.value(addr("A1")), CellValue::Empty);
        assert!(sheet.cell(addr("A2")).is_none());
    }

    #[test]
    fn test_delete_column_shifts_left() {
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_value(addr("A1"), CellValue::Number(1.0));
        sheet.set_value(addr("B1"), CellValue::Number(2.0));
        sheet.set_value(addr("C1"), CellValue::Number(3.0));
        sheet.resize(Axis::Column, 2, 20.0);

        sheet.delete(Axis::Column, 1, 1);

        assert_eq!(sheet.value(addr("A1")), CellValue::Number(1.0));
        assert_eq!(sheet.value(addr("B1")), CellValue::Number(3.0));
        assert_eq!(sheet.value(addr("C1")), CellValue::Empty);
        assert_eq!(sheet.cols, 2);
        assert_eq!(sheet.column_widths.get(&1), Some(&20.0));
    }

    #[test]
    fn test_insert_row_shifts_down() {
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_value(addr("A1"), CellValue::Text("header".into()));
        sheet.set_value(addr("A2"), CellValue::Number(10.0));

        sheet.insert(Axis::Row, 1, 2);

        assert_eq!(sheet.value(addr("A1")), CellValue::Text("header".into()));
        assert_eq!(sheet.value(addr("A4")), CellValue::Number(10.0));
        assert_eq!(sheet.rows, 4);
    }

    #[test]
    fn test_read_block_offsets() {
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_value(addr("B2"), CellValue::Number(1.0));
        let block = sheet.read_block("B2:C2".parse().unwrap());
        assert_eq!(block.len(), 2);
        assert_eq!(block[0].0, 0);
        assert!(block[0].2.is_some());
        assert_eq!(block[1].1, 1);
        assert!(block[1].2.is_none());
    }
}
