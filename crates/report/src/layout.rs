//! The column map: which spreadsheet column receives which field.
//!
//! The mapping is a static table rather than inline conditionals so
//! that layout variants reduce to one engine parameterized by a
//! different `RegisterLayout` value.

use serde::{Deserialize, Serialize};

/// Label written into the lead column of a subtotal row.
///
/// This text is part of the data contract, not cosmetics: every
/// running-balance formula filters the label column with
/// `"<>Итого:"`, so the sentinel and the formulas must never drift
/// apart.
pub const TOTAL_LABEL: &str = "Итого:";

/// The currencies the register tracks, one column triple each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Rub,
    Usd,
    Usdt,
    Euro,
    Cny,
    Aed,
}

impl Currency {
    pub const ALL: [Currency; 6] = [
        Currency::Rub,
        Currency::Usd,
        Currency::Usdt,
        Currency::Euro,
        Currency::Cny,
        Currency::Aed,
    ];

    /// Wire code as the upstream CRM spells it.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Rub => "RUB",
            Currency::Usd => "USD",
            Currency::Usdt => "USDT",
            Currency::Euro => "EURO",
            Currency::Cny => "CNY",
            Currency::Aed => "AED",
        }
    }

    pub fn from_code(code: &str) -> Option<Currency> {
        Currency::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Stable index for per-currency arrays.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Column triple for one currency: the "to disburse" amount, the
/// amount disbursed in cash, and the running-balance formula cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyColumns {
    pub value: u16,
    pub cash: u16,
    pub balance: u16,
}

/// Fixed cell addresses for one register variant. Columns are 0-based
/// indices (0 = A); `first_data_row` is the 1-based row right below
/// the template header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterLayout {
    /// Lead column: marker `1` on data rows, the total label on
    /// subtotal rows
    pub label_col: u16,
    pub date_col: u16,
    pub amount_col: u16,
    pub currency_col: u16,
    pub sender_col: u16,
    pub receiver_col: u16,
    pub rate_col: u16,
    pub comment_col: u16,
    pub first_data_row: u32,
    currency_cols: [CurrencyColumns; 6],
}

impl RegisterLayout {
    pub fn currency_columns(&self, currency: Currency) -> CurrencyColumns {
        self.currency_cols[currency.index()]
    }
}

impl Default for RegisterLayout {
    /// The observed production layout:
    /// A marker, B date, C amount, D currency, E sender, F receiver,
    /// G rate, AB comment; per-currency (value, cash, balance) triples
    /// RUB I/J/V, USD K/L/W, USDT M/N/X, EURO O/P/Y, CNY Q/R/Z,
    /// AED S/T/AA; data starts at row 3.
    fn default() -> Self {
        Self {
            label_col: 0,     // A
            date_col: 1,      // B
            amount_col: 2,    // C
            currency_col: 3,  // D
            sender_col: 4,    // E
            receiver_col: 5,  // F
            rate_col: 6,      // G
            comment_col: 27,  // AB
            first_data_row: 3,
            currency_cols: [
                CurrencyColumns { value: 8, cash: 9, balance: 21 },   // RUB: I, J, V
                CurrencyColumns { value: 10, cash: 11, balance: 22 }, // USD: K, L, W
                CurrencyColumns { value: 12, cash: 13, balance: 23 }, // USDT: M, N, X
                CurrencyColumns { value: 14, cash: 15, balance: 24 }, // EURO: O, P, Y
                CurrencyColumns { value: 16, cash: 17, balance: 25 }, // CNY: Q, R, Z
                CurrencyColumns { value: 18, cash: 19, balance: 26 }, // AED: S, T, AA
            ],
        }
    }
}
