//! Summary Row Builder: closes a date group with per-currency
//! subtotals, running grand totals, and the banded row style.

use kassa_engine::a1::col_to_letter;
use kassa_engine::cell::{CellStyle, CellValue};
use kassa_engine::sheet::Sheet;

use crate::layout::{Currency, RegisterLayout, TOTAL_LABEL};
use crate::row::balance_formula;

/// Banded style for total rows: solid fill, contrasting text, bold.
/// A presentation contract — reference output files are compared
/// against it.
fn total_row_style() -> CellStyle {
    CellStyle {
        bold: true,
        fill: Some("808080".into()),
        font_color: Some("FFFFFF".into()),
        number_format: None,
    }
}

/// Per-column group subtotal: `=SUM(X{start}:X{end})` over a single
/// column (never the value+cash pair).
fn group_sum_formula(col: u16, group_start: u32, group_end: u32) -> String {
    let letter = col_to_letter(col);
    format!("=SUM({letter}{group_start}:{letter}{group_end})")
}

/// Write the subtotal row closing the group `[group_start, group_end]`
/// at `row` (the row immediately after the group's last data row).
///
/// The balance columns get *running* grand totals as of this boundary
/// (first data row through `row - 1`, subtotal rows excluded), not the
/// group's own subtotal — that distinction is deliberate.
pub fn write_summary_row(
    sheet: &mut Sheet,
    layout: &RegisterLayout,
    row: u32,
    group_start: u32,
    group_end: u32,
    first_data_row: u32,
) {
    sheet.set_value(row, layout.label_col, CellValue::Text(TOTAL_LABEL.into()));

    for currency in Currency::ALL {
        let cols = layout.currency_columns(currency);
        sheet.set_formula(row, cols.value, group_sum_formula(cols.value, group_start, group_end));
        sheet.set_formula(row, cols.cash, group_sum_formula(cols.cash, group_start, group_end));
        sheet.set_formula(
            row,
            cols.balance,
            balance_formula(layout, currency, first_data_row, row - 1),
        );
    }

    sheet.set_row_style(row, total_row_style());
}
