use crate::model::address::CellAddr;
use crate::model::sheet::Sheet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sheetx_core_types::{BatchId, WorkbookId};
use std::collections::{BTreeMap, BTreeSet};

/// Workbook-scoped name bound to a sheet range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRange {
    pub name: String,
    pub sheet: String,
    pub range: String,
}

impl NamedRange {
    /// Lookup key; names compare case-insensitively
    pub fn key(name: &str) -> String {
        name.to_ascii_uppercase()
    }
}

/// Named ranges keyed by `NamedRange::key`
pub type NamedRanges = BTreeMap<String, NamedRange>;

/// One applied operation, recorded when its batch commits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub batch_id: BatchId,
    pub index: u32,
    pub kind: String,
    pub sheet: String,
    pub target: String,
    pub at: DateTime<Utc>,
}

/// Full workbook document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub id: WorkbookId,
    pub active_sheet: String,
    #[serde(default)]
    pub sheets: BTreeMap<String, Sheet>,
    #[serde(default)]
    pub named_ranges: NamedRanges,
    #[serde(default)]
    pub history: Vec<ChangeRecord>,
}

impl Workbook {
    /// Empty workbook with a single active sheet
    pub fn new(id: impl Into<WorkbookId>, active_sheet: impl Into<String>) -> Self {
        let active_sheet = active_sheet.into();
        let mut sheets = BTreeMap::new();
        sheets.insert(active_sheet.clone(), Sheet::new(active_sheet.clone()));
        Self {
            id: id.into(),
            active_sheet,
            sheets,
            named_ranges: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    pub fn schema(&self) -> WorkbookSchema {
        WorkbookSchema {
            sheets: self
                .sheets
                .values()
                .map(|s| (s.name.clone(), SheetShape::of(s)))
                .collect(),
            named_ranges: self.named_ranges.keys().cloned().collect(),
        }
    }
}

/// What the validator needs to know about a sheet
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SheetShape {
    pub rows: u32,
    pub cols: u32,
    /// Cells whose number format expects numeric content
    pub numeric_cells: BTreeSet<CellAddr>,
}

impl SheetShape {
    pub fn of(sheet: &Sheet) -> Self {
        Self {
            rows: sheet.rows,
            cols: sheet.cols,
            numeric_cells: sheet
                .cells
                .iter()
                .filter(|(_, c)| c.style.is_numeric())
                .map(|(a, _)| *a)
                .collect(),
        }
    }
}

/// Logical workbook schema: sheet names and dimensions, numeric targets,
/// named-range keys
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkbookSchema {
    pub sheets: BTreeMap<String, SheetShape>,
    pub named_ranges: BTreeSet<String>,
}

impl WorkbookSchema {
    pub fn sheet(&self, name: &str) -> Option<&SheetShape> {
        self.sheets.get(name)
    }

    pub fn has_named_range(&self, name: &str) -> bool {
        self.named_ranges.contains(&NamedRange::key(name))
    }
}
