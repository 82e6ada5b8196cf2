use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellStyle, CellValue};
use crate::formula;

/// A sparse grid of cells. Rows are 1-based sheet row numbers, columns
/// are 0-based indices; `crate::a1` converts between the two worlds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    cells: FxHashMap<(u32, u16), Cell>,
    /// Styles applied to whole rows (banded total rows). A cell-level
    /// style wins over its row style.
    row_styles: FxHashMap<u32, CellStyle>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: FxHashMap::default(),
            row_styles: FxHashMap::default(),
        }
    }

    pub fn set_value(&mut self, row: u32, col: u16, value: CellValue) {
        let cell = self.cells.entry((row, col)).or_default();
        cell.value = value;
    }

    pub fn set_formula(&mut self, row: u32, col: u16, source: impl Into<String>) {
        self.set_value(row, col, CellValue::formula(source));
    }

    pub fn set_style(&mut self, row: u32, col: u16, style: CellStyle) {
        let cell = self.cells.entry((row, col)).or_default();
        cell.style = Some(style);
    }

    pub fn set_row_style(&mut self, row: u32, style: CellStyle) {
        self.row_styles.insert(row, style);
    }

    pub fn value(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cells.get(&(row, col)).map(|c| &c.value)
    }

    pub fn style(&self, row: u32, col: u16) -> Option<&CellStyle> {
        self.cells.get(&(row, col)).and_then(|c| c.style.as_ref())
    }

    pub fn row_style(&self, row: u32) -> Option<&CellStyle> {
        self.row_styles.get(&row)
    }

    /// Style the xlsx writer should apply: the cell's own style, else
    /// its row style.
    pub fn effective_style(&self, row: u32, col: u16) -> Option<&CellStyle> {
        self.style(row, col).or_else(|| self.row_style(row))
    }

    /// Text view of a cell without formula evaluation. Used for
    /// criteria matching (the label column holds literals only).
    pub fn text(&self, row: u32, col: u16) -> String {
        self.value(row, col).map(CellValue::raw_display).unwrap_or_default()
    }

    /// Numeric view of a cell, evaluating formulas. The register never
    /// writes self-referential formulas, so recursion terminates.
    pub fn number(&self, row: u32, col: u16) -> f64 {
        match self.value(row, col) {
            Some(CellValue::Formula { source }) => {
                formula::evaluate_source(self, source).unwrap_or(0.0)
            }
            Some(v) => v.as_number(),
            None => 0.0,
        }
    }

    /// First row at or below `start_row` whose cell in `col` is empty.
    pub fn first_free_row(&self, col: u16, start_row: u32) -> u32 {
        let mut row = start_row;
        while self.value(row, col).is_some_and(|v| !v.is_empty()) {
            row += 1;
        }
        row
    }

    pub fn cells(&self) -> impl Iterator<Item = (u32, u16, &Cell)> {
        self.cells.iter().map(|(&(row, col), cell)| (row, col, cell))
    }

    pub fn row_styles(&self) -> impl Iterator<Item = (u32, &CellStyle)> {
        self.row_styles.iter().map(|(&row, style)| (row, style))
    }

    /// Highest row number holding a cell or a row style, 0 when empty.
    pub fn max_row(&self) -> u32 {
        let cells = self.cells.keys().map(|&(row, _)| row).max().unwrap_or(0);
        let rows = self.row_styles.keys().copied().max().unwrap_or(0);
        cells.max(rows)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
