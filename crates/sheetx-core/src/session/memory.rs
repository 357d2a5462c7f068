use crate::model::{ChangeRecord, NamedRanges, Sheet, Workbook, WorkbookSchema};
use crate::session::{SessionError, WorkbookSession};
use sheetx_core_types::WorkbookId;

/// Session over a workbook held in memory
#[derive(Debug, Clone)]
pub struct InMemorySession {
    workbook: Workbook,
}

impl InMemorySession {
    pub fn new(workbook: Workbook) -> Self {
        Self { workbook }
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    pub fn into_workbook(self) -> Workbook {
        self.workbook
    }
}

impl WorkbookSession for InMemorySession {
    fn workbook_id(&self) -> WorkbookId {
        self.workbook.id.clone()
    }

    fn schema(&self) -> Result<WorkbookSchema, SessionError> {
        Ok(self.workbook.schema())
    }

    fn read_sheet(&self, name: &str) -> Result<Option<Sheet>, SessionError> {
        Ok(self.workbook.sheets.get(name).cloned())
    }

    fn write_sheet(&mut self, sheet: &Sheet) -> Result<(), SessionError> {
        self.workbook
            .sheets
            .insert(sheet.name.clone(), sheet.clone());
        Ok(())
    }

    fn remove_sheet(&mut self, name: &str) -> Result<(), SessionError> {
        self.workbook.sheets.remove(name);
        Ok(())
    }

    fn named_ranges(&self) -> Result<NamedRanges, SessionError> {
        Ok(self.workbook.named_ranges.clone())
    }

    fn write_named_ranges(&mut self, ranges: &NamedRanges) -> Result<(), SessionError> {
        self.workbook.named_ranges = ranges.clone();
        Ok(())
    }

    fn append_history(&mut self, records: &[ChangeRecord]) -> Result<(), SessionError> {
        self.workbook.history.extend_from_slice(records);
        Ok(())
    }
}
