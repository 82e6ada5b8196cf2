// Excel template import (xlsx, xls, ods) and export (xlsx only).
//
// Import: one-way conversion into the in-memory workbook model. Cell
// values only — template header styling is not round-tripped, the
// upstream template already carries it.
// Export: full snapshot of the mutated workbook, including the styles
// and formulas the register wrote.

use std::fmt;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Color, Format, Workbook as XlsxWorkbook};

use kassa_engine::cell::{date_to_serial, CellStyle, CellValue};
use kassa_engine::sheet::Sheet;
use kassa_engine::workbook::Workbook;

/// Number format applied to date cells that carry no explicit one.
const DATE_NUM_FORMAT: &str = "dd.mm.yyyy";

#[derive(Debug, Clone)]
pub enum XlsxError {
    /// Template file missing or unreadable
    Read(String),
    Write(String),
}

impl fmt::Display for XlsxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XlsxError::Read(msg) => write!(f, "xlsx read error: {}", msg),
            XlsxError::Write(msg) => write!(f, "xlsx write error: {}", msg),
        }
    }
}

impl std::error::Error for XlsxError {}

/// Import a template workbook from disk.
pub fn import(path: &Path) -> Result<Workbook, XlsxError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| XlsxError::Read(format!("{}: {}", path.display(), e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| XlsxError::Read(format!("sheet '{}': {}", sheet_name, e)))?;

        let mut sheet = Sheet::new(sheet_name.clone());

        // Data may not begin at A1
        let (start_row, start_col) = range.start().unwrap_or((0, 0));

        for (row_idx, row) in range.rows().enumerate() {
            // calamine rows are 0-based; the sheet model is 1-based
            let target_row = start_row + row_idx as u32 + 1;
            for (col_idx, cell) in row.iter().enumerate() {
                let target_col = (start_col as usize + col_idx) as u16;
                match cell {
                    Data::Empty => {}
                    Data::String(s) => {
                        if !s.is_empty() {
                            sheet.set_value(target_row, target_col, CellValue::Text(s.clone()));
                        }
                    }
                    Data::Float(n) => {
                        sheet.set_value(target_row, target_col, CellValue::Number(*n));
                    }
                    Data::Int(n) => {
                        sheet.set_value(target_row, target_col, CellValue::Number(*n as f64));
                    }
                    Data::Bool(b) => {
                        let text = if *b { "TRUE" } else { "FALSE" };
                        sheet.set_value(target_row, target_col, CellValue::Text(text.into()));
                    }
                    Data::Error(e) => {
                        sheet.set_value(target_row, target_col, CellValue::Text(format!("#{:?}", e)));
                    }
                    Data::DateTime(dt) => {
                        // Kept as a serial number; the template's own
                        // format renders it
                        sheet.set_value(target_row, target_col, CellValue::Number(dt.as_f64()));
                    }
                    Data::DateTimeIso(s) | Data::DurationIso(s) => {
                        sheet.set_value(target_row, target_col, CellValue::Text(s.clone()));
                    }
                }
            }
        }

        sheets.push(sheet);
    }

    Ok(Workbook::from_sheets(sheets))
}

/// Export a workbook to xlsx bytes.
pub fn export_to_buffer(workbook: &Workbook) -> Result<Vec<u8>, XlsxError> {
    let mut xlsx_workbook = XlsxWorkbook::new();

    for sheet in workbook.sheets() {
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(&sheet.name)
            .map_err(|e| XlsxError::Write(format!("sheet '{}': {}", sheet.name, e)))?;

        // Row styles first, so unwritten cells in a banded total row
        // still get the fill
        for (row, style) in sheet.row_styles() {
            worksheet
                .set_row_format(row - 1, &to_format(style))
                .map_err(|e| XlsxError::Write(format!("row {}: {}", row, e)))?;
        }

        let mut cells: Vec<_> = sheet.cells().collect();
        cells.sort_by_key(|&(row, col, _)| (row, col));

        for (row, col, cell) in cells {
            let row32 = row - 1; // 1-based sheet rows, 0-based writer rows
            let style = sheet.effective_style(row, col);
            let format = style.map(to_format);

            let result = match (&cell.value, &format) {
                (CellValue::Empty, _) => continue,
                (CellValue::Text(s), Some(f)) => {
                    worksheet.write_string_with_format(row32, col, s, f)
                }
                (CellValue::Text(s), None) => worksheet.write_string(row32, col, s),
                (CellValue::Number(n), Some(f)) => {
                    worksheet.write_number_with_format(row32, col, *n, f)
                }
                (CellValue::Number(n), None) => worksheet.write_number(row32, col, *n),
                (CellValue::Date(d), _) => {
                    // Serial number plus a date format; explicit style
                    // wins, dd.mm.yyyy otherwise
                    let f = match style {
                        Some(s) if s.number_format.is_some() => to_format(s),
                        Some(s) => {
                            let mut with_date = s.clone();
                            with_date.number_format = Some(DATE_NUM_FORMAT.into());
                            to_format(&with_date)
                        }
                        None => Format::new().set_num_format(DATE_NUM_FORMAT),
                    };
                    worksheet.write_number_with_format(row32, col, date_to_serial(*d), &f)
                }
                (CellValue::Formula { source }, Some(f)) => {
                    worksheet.write_formula_with_format(row32, col, source.as_str(), f)
                }
                (CellValue::Formula { source }, None) => {
                    worksheet.write_formula(row32, col, source.as_str())
                }
            };
            result.map_err(|e| {
                XlsxError::Write(format!("cell ({}, {}): {}", row, col, e))
            })?;
        }
    }

    if let Ok(ws) = xlsx_workbook.worksheet_from_index(workbook.active_sheet_index()) {
        let _ = ws.set_active(true);
    }

    xlsx_workbook
        .save_to_buffer()
        .map_err(|e| XlsxError::Write(e.to_string()))
}

fn to_format(style: &CellStyle) -> Format {
    let mut format = Format::new();
    if style.bold {
        format = format.set_bold();
    }
    if let Some(fill) = &style.fill {
        format = format.set_background_color(parse_hex_color(fill));
    }
    if let Some(color) = &style.font_color {
        format = format.set_font_color(parse_hex_color(color));
    }
    if let Some(num_format) = &style.number_format {
        format = format.set_num_format(num_format);
    }
    format
}

fn parse_hex_color(hex: &str) -> Color {
    match u32::from_str_radix(hex.trim_start_matches('#'), 16) {
        Ok(n) => Color::RGB(n),
        Err(_) => Color::Black,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_workbook() -> Workbook {
        let mut sheet = Sheet::new("tx");
        sheet.set_value(1, 0, CellValue::Text("Реестр".into()));
        sheet.set_value(3, 2, CellValue::Number(100.0));
        sheet.set_value(3, 1, CellValue::Date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
        sheet.set_formula(4, 2, "=SUM(C3:C3)");
        sheet.set_row_style(
            4,
            CellStyle {
                bold: true,
                fill: Some("808080".into()),
                font_color: Some("FFFFFF".into()),
                number_format: None,
            },
        );
        Workbook::from_sheets(vec![sheet])
    }

    #[test]
    fn test_export_produces_xlsx_bytes() {
        let bytes = export_to_buffer(&sample_workbook()).unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_export_import_round_trip_values() {
        let bytes = export_to_buffer(&sample_workbook()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        std::fs::write(&path, &bytes).unwrap();

        let imported = import(&path).unwrap();
        let sheet = imported.active_sheet();
        assert_eq!(sheet.text(1, 0), "Реестр");
        assert_eq!(sheet.number(3, 2), 100.0);
        // Date cells come back as serial numbers
        let serial = date_to_serial(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(sheet.number(3, 1), serial);
    }

    #[test]
    fn test_import_missing_file_is_read_error() {
        let err = import(Path::new("no-such-template.xlsx")).unwrap_err();
        assert!(matches!(err, XlsxError::Read(_)));
    }

    #[test]
    fn test_parse_hex_color_fallback() {
        assert_eq!(parse_hex_color("not-hex"), Color::Black);
        assert_eq!(parse_hex_color("808080"), Color::RGB(0x808080));
        assert_eq!(parse_hex_color("#FFFFFF"), Color::RGB(0xFFFFFF));
    }
}
