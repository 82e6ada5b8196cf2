use serde::{Deserialize, Serialize};

use crate::sheet::Sheet;

/// A workbook containing one or more sheets. The register only ever
/// touches the active sheet; extra template sheets ride along.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    active_sheet: usize,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    /// Create a new workbook with one default sheet.
    pub fn new() -> Self {
        Self {
            sheets: vec![Sheet::new("Sheet1")],
            active_sheet: 0,
        }
    }

    /// Build a workbook from imported sheets. Falls back to a single
    /// empty sheet when the import produced none.
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        if sheets.is_empty() {
            return Self::new();
        }
        Self { sheets, active_sheet: 0 }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn active_sheet_index(&self) -> usize {
        self.active_sheet
    }

    pub fn active_sheet(&self) -> &Sheet {
        &self.sheets[self.active_sheet]
    }

    pub fn active_sheet_mut(&mut self) -> &mut Sheet {
        &mut self.sheets[self.active_sheet]
    }
}
