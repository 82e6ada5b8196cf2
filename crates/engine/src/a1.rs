//! A1-style cell addressing.
//!
//! Rows are 1-based sheet row numbers (as displayed in a spreadsheet);
//! columns are 0-based indices (0 = A, 26 = AA).

/// Convert a column index to its letter name (0 = A, 25 = Z, 26 = AA, etc.)
pub fn col_to_letter(col: u16) -> String {
    let mut result = String::new();
    let mut n = col as usize;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Convert a column letter name to its index (A = 0, AA = 26).
/// Returns `None` for empty or non-alphabetic input.
pub fn letter_to_col(s: &str) -> Option<u16> {
    if s.is_empty() {
        return None;
    }
    let mut n: usize = 0;
    for c in s.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        n = n * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some((n - 1) as u16)
}

/// Format a cell reference like `B3` from a column index and 1-based row.
pub fn cell_ref(col: u16, row: u32) -> String {
    format!("{}{}", col_to_letter(col), row)
}

/// Parse a cell reference like `B3` into (column index, 1-based row).
pub fn parse_cell_ref(s: &str) -> Option<(u16, u32)> {
    let split = s.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = s.split_at(split);
    let col = letter_to_col(letters)?;
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((col, row))
}
