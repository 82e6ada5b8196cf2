use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cell formatting options. Colors are 6-digit RGB hex strings
/// without a leading `#` (e.g. "808080"), matching the xlsx writer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CellStyle {
    pub bold: bool,
    pub fill: Option<String>,
    pub font_color: Option<String>,
    /// Excel number format string, e.g. "dd.mm.yyyy"
    pub number_format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Formula { source: String },
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    pub fn formula(source: impl Into<String>) -> Self {
        CellValue::Formula { source: source.into() }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Non-evaluating numeric view: formulas report 0 here.
    /// Use `Sheet::number` to resolve formulas.
    pub fn as_number(&self) -> f64 {
        match self {
            CellValue::Number(n) => *n,
            CellValue::Date(d) => date_to_serial(*d),
            CellValue::Text(s) => s.parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn raw_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Date(d) => d.format("%d.%m.%Y").to_string(),
            CellValue::Formula { source } => source.clone(),
        }
    }
}

/// Convert a calendar date to an Excel serial number (epoch 1899-12-30).
///
/// Excel's fictitious 1900-02-29 (serial 60) sits before that epoch
/// shift, so dates on or before 1900-02-28 come out one low; the
/// register never sees dates that old.
pub fn date_to_serial(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    (date - epoch).num_days() as f64
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    pub style: Option<CellStyle>,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Self { value, style: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_serial_known_values() {
        // Known Excel serials - if these are wrong, dates will be off.
        let cases = [
            ((1900, 3, 1), 61.0),
            ((2000, 1, 1), 36526.0),
            ((2024, 1, 1), 45292.0),
            ((2024, 2, 29), 45351.0),
            ((2025, 1, 1), 45658.0),
        ];
        for ((y, m, d), serial) in cases {
            let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            assert_eq!(date_to_serial(date), serial, "{}-{}-{}", y, m, d);
        }
    }

    #[test]
    fn test_as_number() {
        assert_eq!(CellValue::Number(1.5).as_number(), 1.5);
        assert_eq!(CellValue::Text("12".into()).as_number(), 12.0);
        assert_eq!(CellValue::Text("горох".into()).as_number(), 0.0);
        assert_eq!(CellValue::Empty.as_number(), 0.0);
        assert_eq!(CellValue::formula("=SUM(A1:A2)").as_number(), 0.0);
    }

    #[test]
    fn test_raw_display() {
        assert_eq!(CellValue::Number(75.0).raw_display(), "75");
        assert_eq!(CellValue::Number(0.5).raw_display(), "0.5");
        let d = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(CellValue::Date(d).raw_display(), "02.01.2025");
    }
}
