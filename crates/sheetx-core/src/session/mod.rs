//! Workbook session seam
//!
//! The applier never holds a global workbook handle. Callers pass a
//! session object scoped to the batch, and every read and write goes
//! through it.

pub mod memory;

pub use memory::InMemorySession;

use crate::model::{ChangeRecord, NamedRanges, Sheet, WorkbookSchema};
use sheetx_core_types::WorkbookId;
use thiserror::Error;

/// Failure reported by a session backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Backend cannot be reached or read at all
    #[error("workbook unavailable: {message}")]
    Unavailable { message: String },

    /// A sheet expected to exist is gone
    #[error("sheet missing: {sheet}")]
    SheetMissing { sheet: String },

    /// Failure that may succeed on retry
    #[error("transient failure: {message}")]
    Transient { message: String },

    /// Backend does not support the call
    #[error("unsupported: {message}")]
    Unsupported { message: String },
}

/// Explicit handle on one workbook
///
/// Sheet reads return owned copies; a sheet is replaced wholesale by
/// `write_sheet`.
pub trait WorkbookSession {
    fn workbook_id(&self) -> WorkbookId;

    /// Current sheet names, dimensions, numeric targets and names
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the workbook cannot be read.
    fn schema(&self) -> Result<WorkbookSchema, SessionError>;

    /// # Errors
    ///
    /// Returns `SessionError` when the workbook cannot be read. A missing
    /// sheet is `Ok(None)`.
    fn read_sheet(&self, name: &str) -> Result<Option<Sheet>, SessionError>;

    /// Create or replace a sheet
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the write does not land.
    fn write_sheet(&mut self, sheet: &Sheet) -> Result<(), SessionError>;

    /// Remove a sheet; removing an absent sheet is not an error
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the write does not land.
    fn remove_sheet(&mut self, name: &str) -> Result<(), SessionError>;

    /// # Errors
    ///
    /// Returns `SessionError` when the workbook cannot be read.
    fn named_ranges(&self) -> Result<NamedRanges, SessionError>;

    /// Replace the whole named-range table
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the write does not land.
    fn write_named_ranges(&mut self, ranges: &NamedRanges) -> Result<(), SessionError>;

    /// # Errors
    ///
    /// Returns `SessionError` when the write does not land.
    fn append_history(&mut self, records: &[ChangeRecord]) -> Result<(), SessionError>;
}
