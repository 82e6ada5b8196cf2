//! Parser and evaluator for the formula shapes the register writes:
//! `=SUM(range)` and `=SUMIF(range,"criteria",sum_range)`.
//!
//! This is not a general spreadsheet evaluator. It exists so the
//! grouping and balance invariants can be checked numerically against
//! the in-memory sheet instead of eyeballing formula text.

use std::fmt;

use crate::a1;
use crate::sheet::Sheet;

/// A rectangular range. Rows 1-based, columns 0-based, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start_row: u32,
    pub start_col: u16,
    pub end_row: u32,
    pub end_col: u16,
}

impl Range {
    pub fn rows(&self) -> u32 {
        self.end_row.saturating_sub(self.start_row) + 1
    }

    pub fn contains_row(&self, row: u32) -> bool {
        (self.start_row..=self.end_row).contains(&row)
    }
}

/// SUMIF text criterion. Only the comparisons the register emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    Equals(String),
    NotEquals(String),
}

impl Criterion {
    fn matches(&self, text: &str) -> bool {
        match self {
            Criterion::Equals(t) => text == t,
            Criterion::NotEquals(t) => text != t,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Sum(Range),
    SumIf {
        criteria: Range,
        criterion: Criterion,
        sum: Range,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormulaError {
    /// Function or syntax outside the supported SUM/SUMIF shapes
    Unsupported(String),
    BadRange(String),
    BadCriterion(String),
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaError::Unsupported(s) => write!(f, "unsupported formula: {}", s),
            FormulaError::BadRange(s) => write!(f, "invalid range: {}", s),
            FormulaError::BadCriterion(s) => write!(f, "invalid criterion: {}", s),
        }
    }
}

impl std::error::Error for FormulaError {}

/// Parse a formula source like `=SUM(I3:I5)` or
/// `=SUMIF(A3:A7,"<>Итого:",I3:J7)`.
pub fn parse(source: &str) -> Result<Expr, FormulaError> {
    let body = source.trim().strip_prefix('=').unwrap_or(source.trim());

    if let Some(inner) = strip_call(body, "SUM") {
        return Ok(Expr::Sum(parse_range(inner)?));
    }
    if let Some(inner) = strip_call(body, "SUMIF") {
        let args: Vec<&str> = inner.splitn(3, ',').map(str::trim).collect();
        if args.len() != 3 {
            return Err(FormulaError::Unsupported(source.to_string()));
        }
        return Ok(Expr::SumIf {
            criteria: parse_range(args[0])?,
            criterion: parse_criterion(args[1])?,
            sum: parse_range(args[2])?,
        });
    }

    Err(FormulaError::Unsupported(source.to_string()))
}

fn strip_call<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    let rest = body.strip_prefix(name)?;
    rest.strip_prefix('(')?.strip_suffix(')')
}

fn parse_range(s: &str) -> Result<Range, FormulaError> {
    let (start, end) = s
        .split_once(':')
        .ok_or_else(|| FormulaError::BadRange(s.to_string()))?;
    let (start_col, start_row) =
        a1::parse_cell_ref(start).ok_or_else(|| FormulaError::BadRange(s.to_string()))?;
    let (end_col, end_row) =
        a1::parse_cell_ref(end).ok_or_else(|| FormulaError::BadRange(s.to_string()))?;
    if end_row < start_row || end_col < start_col {
        return Err(FormulaError::BadRange(s.to_string()));
    }
    Ok(Range { start_row, start_col, end_row, end_col })
}

fn parse_criterion(s: &str) -> Result<Criterion, FormulaError> {
    let unquoted = s
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(|| FormulaError::BadCriterion(s.to_string()))?;
    match unquoted.strip_prefix("<>") {
        Some(t) => Ok(Criterion::NotEquals(t.to_string())),
        None => Ok(Criterion::Equals(unquoted.to_string())),
    }
}

/// Evaluate a parsed expression against a sheet.
///
/// SUMIF semantics: the criteria range is walked row by row; on a
/// match, every column of the sum range contributes at the matching
/// row offset. This is the pairing the register's value+cash ranges
/// intend (a sum range may span two columns against a one-column
/// criteria range).
pub fn evaluate(sheet: &Sheet, expr: &Expr) -> f64 {
    match expr {
        Expr::Sum(range) => {
            let mut total = 0.0;
            for row in range.start_row..=range.end_row {
                for col in range.start_col..=range.end_col {
                    total += sheet.number(row, col);
                }
            }
            total
        }
        Expr::SumIf { criteria, criterion, sum } => {
            let mut total = 0.0;
            for offset in 0..criteria.rows() {
                let crit_row = criteria.start_row + offset;
                let text = sheet.text(crit_row, criteria.start_col);
                if !criterion.matches(&text) {
                    continue;
                }
                let sum_row = sum.start_row + offset;
                if sum_row > sum.end_row {
                    break;
                }
                for col in sum.start_col..=sum.end_col {
                    total += sheet.number(sum_row, col);
                }
            }
            total
        }
    }
}

/// Parse and evaluate a formula source string.
pub fn evaluate_source(sheet: &Sheet, source: &str) -> Result<f64, FormulaError> {
    Ok(evaluate(sheet, &parse(source)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    fn sheet_with_numbers(rows: &[(u32, u16, f64)]) -> Sheet {
        let mut sheet = Sheet::new("tx");
        for &(row, col, n) in rows {
            sheet.set_value(row, col, CellValue::Number(n));
        }
        sheet
    }

    #[test]
    fn test_parse_sum() {
        let expr = parse("=SUM(I3:I5)").unwrap();
        assert_eq!(
            expr,
            Expr::Sum(Range { start_row: 3, start_col: 8, end_row: 5, end_col: 8 })
        );
    }

    #[test]
    fn test_parse_sumif_not_equals() {
        let expr = parse("=SUMIF(A3:A7,\"<>Итого:\",I3:J7)").unwrap();
        match expr {
            Expr::SumIf { criteria, criterion, sum } => {
                assert_eq!(criteria.start_col, 0);
                assert_eq!(criterion, Criterion::NotEquals("Итого:".to_string()));
                assert_eq!(sum.start_col, 8);
                assert_eq!(sum.end_col, 9);
            }
            other => panic!("expected SUMIF, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_other_functions() {
        assert!(matches!(parse("=AVERAGE(A1:A2)"), Err(FormulaError::Unsupported(_))));
        assert!(matches!(parse("=SUM(A1)"), Err(FormulaError::BadRange(_))));
    }

    #[test]
    fn test_sum_over_range() {
        let sheet = sheet_with_numbers(&[(3, 8, 100.0), (4, 8, -50.0), (5, 8, 25.0)]);
        assert_eq!(evaluate_source(&sheet, "=SUM(I3:I5)").unwrap(), 75.0);
    }

    #[test]
    fn test_sum_resolves_nested_formulas() {
        let mut sheet = sheet_with_numbers(&[(3, 8, 10.0), (4, 8, 5.0)]);
        sheet.set_formula(5, 8, "=SUM(I3:I4)");
        assert_eq!(evaluate_source(&sheet, "=SUM(I5:I5)").unwrap(), 15.0);
    }

    #[test]
    fn test_sumif_skips_label_rows() {
        let mut sheet = sheet_with_numbers(&[(3, 8, 100.0), (5, 8, 40.0)]);
        sheet.set_value(3, 0, CellValue::Number(1.0));
        sheet.set_value(4, 0, CellValue::Text("Итого:".into()));
        sheet.set_value(4, 8, CellValue::Number(999.0)); // must be excluded
        sheet.set_value(5, 0, CellValue::Number(1.0));
        let total = evaluate_source(&sheet, "=SUMIF(A3:A5,\"<>Итого:\",I3:I5)").unwrap();
        assert_eq!(total, 140.0);
    }

    #[test]
    fn test_sumif_two_column_sum_range() {
        let mut sheet = sheet_with_numbers(&[(3, 8, 100.0), (3, 9, 7.0)]);
        sheet.set_value(3, 0, CellValue::Number(1.0));
        let total = evaluate_source(&sheet, "=SUMIF(A3:A3,\"<>Итого:\",I3:J3)").unwrap();
        assert_eq!(total, 107.0);
    }
}
