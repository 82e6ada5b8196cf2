//! Row Writer: one normalized record into one sheet row.

use kassa_engine::a1::col_to_letter;
use kassa_engine::cell::{CellStyle, CellValue};
use kassa_engine::sheet::Sheet;

use crate::layout::{Currency, RegisterLayout, TOTAL_LABEL};
use crate::normalize::{DateField, NormalizedRecord};

/// Display format for parsed dates.
const DATE_FORMAT: &str = "dd.mm.yyyy";

/// Running-balance formula for one currency: SUMIF over the label
/// column (skipping subtotal rows) applied to the currency's paired
/// value+cash columns, from the first data row through `row`.
///
/// Self-correcting by construction: subtotal rows interleaved above
/// are excluded by the label test, so the balance reflects true data
/// rows only.
pub fn balance_formula(
    layout: &RegisterLayout,
    currency: Currency,
    first_data_row: u32,
    row: u32,
) -> String {
    let label = col_to_letter(layout.label_col);
    let cols = layout.currency_columns(currency);
    format!(
        "=SUMIF({label}{first}:{label}{row},\"<>{sentinel}\",{value}{first}:{cash}{row})",
        label = label,
        first = first_data_row,
        row = row,
        sentinel = TOTAL_LABEL,
        value = col_to_letter(cols.value),
        cash = col_to_letter(cols.cash),
    )
}

/// Write one data row. `first_data_row` anchors the balance formulas;
/// it is the top of the sheet's data region, not of the current group.
pub fn write_row(
    sheet: &mut Sheet,
    layout: &RegisterLayout,
    row: u32,
    record: &NormalizedRecord,
    first_data_row: u32,
) {
    // Lead-column marker. A subtotal row lands on a fresh row index,
    // so the orchestrator's call order never leaves a stale marker
    // under the total label.
    sheet.set_value(row, layout.label_col, CellValue::Number(1.0));

    match &record.date {
        DateField::Parsed(date) => {
            sheet.set_value(row, layout.date_col, CellValue::Date(*date));
            sheet.set_style(
                row,
                layout.date_col,
                CellStyle {
                    number_format: Some(DATE_FORMAT.into()),
                    ..Default::default()
                },
            );
        }
        DateField::Raw(text) => {
            sheet.set_value(row, layout.date_col, CellValue::Text(text.clone()));
        }
    }

    sheet.set_value(row, layout.amount_col, CellValue::Number(record.primary_amount()));
    sheet.set_value(row, layout.currency_col, CellValue::Text(record.currency_name.clone()));
    sheet.set_value(row, layout.sender_col, CellValue::Text(record.sender.clone()));
    sheet.set_value(row, layout.receiver_col, CellValue::Text(record.receiver.clone()));
    sheet.set_value(row, layout.rate_col, CellValue::Text(record.rate.clone()));
    sheet.set_value(row, layout.comment_col, CellValue::Text(record.comment.clone()));

    // Per-currency breakdown. Absent amounts leave the cell unwritten
    // (not zero-written); a record may populate several currencies at
    // once. Balance formulas go on every data row regardless.
    for currency in Currency::ALL {
        let cols = layout.currency_columns(currency);
        if let Some(amount) = record.amount(currency) {
            sheet.set_value(row, cols.value, CellValue::Number(amount));
        }
        if let Some(cash) = record.cash_amount(currency) {
            sheet.set_value(row, cols.cash, CellValue::Number(cash));
        }
        sheet.set_formula(
            row,
            cols.balance,
            balance_formula(layout, currency, first_data_row, row),
        );
    }
}
