//! Batch Orchestrator: sorts records by date, walks them in order,
//! writes data rows, and closes each date group with a subtotal row.

use serde_json::Value;

use kassa_engine::sheet::Sheet;

use crate::layout::RegisterLayout;
use crate::normalize::{normalize, NormalizedRecord};
use crate::row::write_row;
use crate::summary::write_summary_row;

/// What a fill pass did, for request logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub rows_written: usize,
    pub groups_closed: usize,
    /// First row the pass wrote to (the sheet's first free row)
    pub first_row: u32,
    /// Row after the last one written
    pub next_row: u32,
}

/// Fill the register with a batch of raw records.
///
/// Records are sorted by parsed date (stable: unparseable dates keep
/// their relative order, as the source's comparator did). Group
/// boundaries compare raw date *strings* — two spellings of the same
/// calendar day open separate groups on purpose.
pub fn fill_register(sheet: &mut Sheet, layout: &RegisterLayout, records: &[Value]) -> FillReport {
    let mut normalized: Vec<NormalizedRecord> = records.iter().map(normalize).collect();
    normalized.sort_by(|a, b| match (a.date.parsed(), b.date.parsed()) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => std::cmp::Ordering::Equal,
    });

    let first_data_row = layout.first_data_row;
    let first_row = sheet.first_free_row(layout.date_col, first_data_row);

    let mut current_row = first_row;
    let mut group_start = current_row;
    let mut last_date: Option<&str> = None;
    let mut report = FillReport {
        first_row,
        next_row: first_row,
        ..Default::default()
    };

    for record in &normalized {
        // Date changed: close the open group before this record
        if let Some(prev) = last_date {
            if prev != record.raw_date {
                write_summary_row(sheet, layout, current_row, group_start, current_row - 1, first_data_row);
                report.groups_closed += 1;
                current_row += 1;
                group_start = current_row;
            }
        }
        last_date = Some(&record.raw_date);

        write_row(sheet, layout, current_row, record, first_data_row);
        report.rows_written += 1;
        current_row += 1;
    }

    // The final group has no successor to close it
    if !normalized.is_empty() {
        write_summary_row(sheet, layout, current_row, group_start, current_row - 1, first_data_row);
        report.groups_closed += 1;
        current_row += 1;
    }

    report.next_row = current_row;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Currency, TOTAL_LABEL};
    use kassa_engine::cell::CellValue;
    use kassa_engine::formula;
    use serde_json::json;

    fn layout() -> RegisterLayout {
        RegisterLayout::default()
    }

    fn usd_record(date: &str, amount: f64) -> Value {
        json!({
            "Дата": date,
            "Валюта": {"name": "USD"},
            "Сумма USD": amount
        })
    }

    fn label_rows(sheet: &Sheet, layout: &RegisterLayout, through: u32) -> Vec<u32> {
        (layout.first_data_row..=through)
            .filter(|&row| sheet.text(row, layout.label_col) == TOTAL_LABEL)
            .collect()
    }

    #[test]
    fn test_single_group_one_summary_row() {
        let layout = layout();
        let mut sheet = Sheet::new("tx");
        let records = vec![
            usd_record("2025-01-01", 100.0),
            usd_record("2025-01-01", -50.0),
            usd_record("2025-01-01", 25.0),
        ];
        let report = fill_register(&mut sheet, &layout, &records);

        assert_eq!(report.rows_written, 3);
        assert_eq!(report.groups_closed, 1);
        assert_eq!(report.first_row, 3);
        assert_eq!(report.next_row, 7);

        // Summary row sits immediately after the group's last data row
        assert_eq!(label_rows(&sheet, &layout, 7), vec![6]);

        // And its USD subtotal evaluates to the group sum
        let usd = layout.currency_columns(Currency::Usd);
        assert_eq!(sheet.number(6, usd.value), 75.0);
    }

    #[test]
    fn test_two_dates_two_groups() {
        let layout = layout();
        let mut sheet = Sheet::new("tx");
        let records = vec![
            usd_record("2025-01-01", 100.0),
            usd_record("2025-01-02", 30.0),
        ];
        let report = fill_register(&mut sheet, &layout, &records);

        assert_eq!(report.groups_closed, 2);
        // row 3 data, row 4 summary, row 5 data, row 6 summary
        assert_eq!(label_rows(&sheet, &layout, 7), vec![4, 6]);

        let usd = layout.currency_columns(Currency::Usd);
        assert_eq!(sheet.number(4, usd.value), 100.0);
        assert_eq!(sheet.number(6, usd.value), 30.0);
    }

    #[test]
    fn test_unsorted_input_is_sorted_by_date() {
        let layout = layout();
        let mut sheet = Sheet::new("tx");
        let records = vec![
            usd_record("2025-01-02", 30.0),
            usd_record("2025-01-01", 100.0),
            usd_record("2025-01-02", 5.0),
        ];
        let report = fill_register(&mut sheet, &layout, &records);

        // Sorted into two contiguous groups despite interleaved input
        assert_eq!(report.groups_closed, 2);
        assert_eq!(sheet.number(3, layout.amount_col), 100.0);
        let usd = layout.currency_columns(Currency::Usd);
        assert_eq!(sheet.number(4, usd.value), 100.0);
        assert_eq!(sheet.number(7, usd.value), 35.0);
    }

    #[test]
    fn test_same_day_different_spelling_splits_groups() {
        // String equality, not calendar equality
        let layout = layout();
        let mut sheet = Sheet::new("tx");
        let records = vec![
            usd_record("2025-01-01", 10.0),
            usd_record("01.01.2025", 20.0),
        ];
        let report = fill_register(&mut sheet, &layout, &records);
        assert_eq!(report.groups_closed, 2);
    }

    #[test]
    fn test_empty_batch_leaves_sheet_untouched() {
        let layout = layout();
        let mut sheet = Sheet::new("tx");
        let report = fill_register(&mut sheet, &layout, &[]);
        assert_eq!(report, FillReport { first_row: 3, next_row: 3, ..Default::default() });
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_fill_appends_below_existing_rows() {
        let layout = layout();
        let mut sheet = Sheet::new("tx");
        // Header plus two occupied data rows in the date column
        sheet.set_value(3, layout.date_col, CellValue::Text("x".into()));
        sheet.set_value(4, layout.date_col, CellValue::Text("x".into()));
        let report = fill_register(&mut sheet, &layout, &[usd_record("2025-01-01", 1.0)]);
        assert_eq!(report.first_row, 5);
        assert_eq!(sheet.number(5, layout.label_col), 1.0);
    }

    #[test]
    fn test_running_balances_never_cover_label_rows() {
        let layout = layout();
        let mut sheet = Sheet::new("tx");
        let records = vec![
            usd_record("2025-01-01", 100.0),
            usd_record("2025-01-02", 50.0),
            usd_record("2025-01-03", -30.0),
        ];
        fill_register(&mut sheet, &layout, &records);

        let usd = layout.currency_columns(Currency::Usd);
        // Last data row is 7 (3 data, 4 total, 5 data, 6 total, 7 data, 8 total)
        let balance = match sheet.value(7, usd.balance) {
            Some(CellValue::Formula { source }) => {
                formula::evaluate_source(&sheet, source).unwrap()
            }
            other => panic!("expected formula, got {:?}", other),
        };
        // 100 + 50 - 30, with both interleaved subtotal rows excluded
        assert_eq!(balance, 120.0);

        // The final summary's running grand total matches as well
        let grand = match sheet.value(8, usd.balance) {
            Some(CellValue::Formula { source }) => {
                formula::evaluate_source(&sheet, source).unwrap()
            }
            other => panic!("expected formula, got {:?}", other),
        };
        assert_eq!(grand, 120.0);
    }

    #[test]
    fn test_generic_amount_fallback_row() {
        let layout = layout();
        let mut sheet = Sheet::new("tx");
        let records = vec![json!({
            "Дата": "2025-01-01",
            "Сумма_Ордер": [42.0]
        })];
        fill_register(&mut sheet, &layout, &records);
        assert_eq!(sheet.number(3, layout.amount_col), 42.0);
    }
}
