//! A1-style grid addressing
//!
//! Rows and columns are stored 0-based; the textual form is the usual
//! column letters followed by a 1-based row number (`A1`, `XFD1048576`).

use crate::config::{GRID_MAX_COLS, GRID_MAX_ROWS};
use crate::errors::{Result, SheetXError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest column label the grid supports (`XFD`)
const MAX_COLUMN_LETTERS: usize = 3;

/// A single cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellAddr {
    pub row: u32,
    pub col: u32,
}

impl CellAddr {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Shift by a row/column offset, failing past the grid edge
    pub fn offset(&self, rows: u32, cols: u32) -> Option<CellAddr> {
        let row = self.row.checked_add(rows)?;
        let col = self.col.checked_add(cols)?;
        (row < GRID_MAX_ROWS && col < GRID_MAX_COLS).then_some(CellAddr { row, col })
    }
}

impl fmt::Display for CellAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col), self.row + 1)
    }
}

impl FromStr for CellAddr {
    type Err = SheetXError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SheetXError::InvalidCellRef {
            reference: s.to_string(),
        };

        let split = s.find(|c: char| !c.is_ascii_uppercase()).ok_or_else(invalid)?;
        let (letters, digits) = s.split_at(split);
        if letters.is_empty()
            || digits.is_empty()
            || digits.starts_with('0')
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let col = letters_to_col(letters).ok_or_else(invalid)?;
        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row > GRID_MAX_ROWS {
            return Err(invalid());
        }
        Ok(CellAddr { row: row - 1, col })
    }
}

impl TryFrom<String> for CellAddr {
    type Error = SheetXError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CellAddr> for String {
    fn from(addr: CellAddr) -> Self {
        addr.to_string()
    }
}

/// Rectangular range, both corners inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeRef {
    pub start: CellAddr,
    pub end: CellAddr,
}

impl RangeRef {
    pub fn single(addr: CellAddr) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    pub fn rows(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn cols(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    pub fn contains(&self, addr: CellAddr) -> bool {
        (self.start.row..=self.end.row).contains(&addr.row)
            && (self.start.col..=self.end.col).contains(&addr.col)
    }

    /// Cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = CellAddr> + '_ {
        (self.start.row..=self.end.row)
            .flat_map(move |row| (self.start.col..=self.end.col).map(move |col| CellAddr { row, col }))
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for RangeRef {
    type Err = SheetXError;

    /// Parse `A1:B2`; a lone cell is accepted as a one-cell range.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| SheetXError::InvalidRangeRef {
            reference: s.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = s.split(':');
        let first = parts.next().unwrap_or_default();
        let second = parts.next();
        if parts.next().is_some() {
            return Err(invalid("more than one ':'"));
        }

        let start: CellAddr = first
            .parse()
            .map_err(|_| invalid("start is not a cell reference"))?;
        let end: CellAddr = match second {
            Some(text) => text
                .parse()
                .map_err(|_| invalid("end is not a cell reference"))?,
            None => start,
        };

        if start.row > end.row || start.col > end.col {
            return Err(invalid("start must not be below or right of end"));
        }
        Ok(RangeRef { start, end })
    }
}

/// Parse a column label (`A`, `AB`, `XFD`) to a 0-based index
///
/// # Errors
///
/// Returns `SheetXError::InvalidColumnRef` for lowercase, empty, overlong
/// or out-of-grid labels.
pub fn parse_column(label: &str) -> Result<u32> {
    letters_to_col(label).ok_or_else(|| SheetXError::InvalidColumnRef {
        column: label.to_string(),
    })
}

/// Parse a 1-based row number to a 0-based index
///
/// # Errors
///
/// Returns `SheetXError::InvalidRowRef` for zero or rows past the grid.
pub fn parse_row(row: u32) -> Result<u32> {
    if row == 0 || row > GRID_MAX_ROWS {
        return Err(SheetXError::InvalidRowRef { row });
    }
    Ok(row - 1)
}

fn letters_to_col(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > MAX_COLUMN_LETTERS {
        return None;
    }
    let mut col = 0u32;
    for b in letters.bytes() {
        if !b.is_ascii_uppercase() {
            return None;
        }
        col = col * 26 + u32::from(b - b'A' + 1);
    }
    let col = col - 1;
    (col < GRID_MAX_COLS).then_some(col)
}

/// Convert a 0-based column index to letters (0 = A, 26 = AA)
pub fn col_to_letters(mut col: u32) -> String {
    let mut result = Vec::new();
    loop {
        result.push(char::from(b'A' + (col % 26) as u8));
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result.iter().rev().collect()
}
