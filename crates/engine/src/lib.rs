// In-memory workbook model: cells, styles, A1 addressing, and the
// SUM/SUMIF evaluator used to check register formulas.

pub mod a1;
pub mod cell;
pub mod formula;
pub mod sheet;
pub mod workbook;
