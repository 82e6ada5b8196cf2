//! Record normalization: loosely-structured CRM records in, typed
//! records out. Every field has a defined fallback — normalization
//! never fails, and feeding it an already-normalized shape (plain
//! strings where arrays are expected) degrades gracefully.

use chrono::NaiveDate;
use serde_json::Value;

use crate::layout::Currency;

// Wire field keys, as the upstream CRM spells them.
const KEY_DATE: &str = "Дата";
const KEY_SENDER: &str = "Отправитель";
const KEY_RECEIVER: &str = "Получатель";
const KEY_CURRENCY: &str = "Валюта";
const KEY_RATE: &str = "Курс";
const KEY_COMMENT: &str = "Комментарий (from Ордер)";
const KEY_ORDER_AMOUNT: &str = "Сумма_Ордер";

fn amount_key(currency: Currency) -> String {
    format!("Сумма {}", currency.code())
}

fn cash_key(currency: Currency) -> String {
    format!("Сумма {} КЕШ", currency.code())
}

/// A date that either parsed or did not. An unparseable date is a
/// fallback, never an error: the raw text ends up in the date cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateField {
    Parsed(NaiveDate),
    Raw(String),
}

impl DateField {
    pub fn parsed(&self) -> Option<NaiveDate> {
        match self {
            DateField::Parsed(d) => Some(*d),
            DateField::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub date: DateField,
    /// Raw date text; group boundaries compare this, not the parsed
    /// date (string equality is the grouping contract)
    pub raw_date: String,
    pub sender: String,
    pub receiver: String,
    /// Display name of the currency, as received
    pub currency_name: String,
    /// Parsed currency; `None` for unknown or absent codes
    pub currency: Option<Currency>,
    amounts: [Option<f64>; 6],
    cash_amounts: [Option<f64>; 6],
    pub order_amount: f64,
    pub rate: String,
    pub comment: String,
}

impl NormalizedRecord {
    /// "To disburse" amount for one currency. `None` means the column
    /// stays unwritten; absent and zero amounts both land here.
    pub fn amount(&self, currency: Currency) -> Option<f64> {
        self.amounts[currency.index()]
    }

    /// Cash-disbursed amount for one currency.
    pub fn cash_amount(&self, currency: Currency) -> Option<f64> {
        self.cash_amounts[currency.index()]
    }

    /// The row's primary amount: the record's own currency amount,
    /// falling back to the generic order amount when the currency is
    /// unknown or absent. Missing fields default to 0 here — unlike
    /// the per-currency breakdown columns, which stay unwritten.
    pub fn primary_amount(&self) -> f64 {
        match self.currency {
            Some(currency) => self.amount(currency).unwrap_or(0.0),
            None => self.order_amount,
        }
    }
}

/// Normalize one raw record. Tolerates absent, null, scalar, and
/// array-wrapped fields.
pub fn normalize(raw: &Value) -> NormalizedRecord {
    let raw_date = match raw.get(KEY_DATE) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    let date = match parse_date(&raw_date) {
        Some(d) => DateField::Parsed(d),
        None => DateField::Raw(raw_date.clone()),
    };

    let currency_name = name_field(raw.get(KEY_CURRENCY));

    let mut amounts = [None; 6];
    let mut cash_amounts = [None; 6];
    for currency in Currency::ALL {
        amounts[currency.index()] = breakdown_field(raw.get(amount_key(currency).as_str()));
        cash_amounts[currency.index()] = breakdown_field(raw.get(cash_key(currency).as_str()));
    }

    NormalizedRecord {
        date,
        raw_date,
        sender: name_field(raw.get(KEY_SENDER)),
        receiver: name_field(raw.get(KEY_RECEIVER)),
        currency: Currency::from_code(&currency_name),
        currency_name,
        amounts,
        cash_amounts,
        order_amount: order_amount(raw.get(KEY_ORDER_AMOUNT)),
        rate: joined_field(raw.get(KEY_RATE)),
        comment: joined_field(raw.get(KEY_COMMENT)),
    }
}

/// Date formats the CRM has been seen emitting.
fn parse_date(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d.%m.%Y"))
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Name-bearing field: a length-1 array of `{ "name": … }` objects, a
/// bare `{ "name": … }` object, or an already-resolved string.
fn name_field(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match value {
        Value::Array(items) => items.first().map(|v| name_field(Some(v))).unwrap_or_default(),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

/// Text-or-list field: arrays are joined with `"; "`, scalars pass
/// through.
fn joined_field(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match value {
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join("; "),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Numeric field: absent, null, and non-numeric all mean "not
/// present". Numeric strings parse.
fn number_field(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Per-currency breakdown amount. Zero means nothing was disbursed in
/// that currency and counts as not-present, same as absence.
fn breakdown_field(value: Option<&Value>) -> Option<f64> {
    number_field(value).filter(|v| *v != 0.0)
}

/// Generic order amount: first element when an array, the number
/// itself when scalar, 0 when absent.
fn order_amount(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Array(items)) => items.first().and_then(|v| number_field(Some(v))).unwrap_or(0.0),
        other => number_field(other).unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_record() {
        let raw = json!({
            "Дата": "2025-01-01",
            "Отправитель": [{"name": "Иванов"}],
            "Получатель": [{"name": "Петров"}],
            "Валюта": {"name": "USD"},
            "Сумма USD": 100.0,
            "Сумма USD КЕШ": 40.0,
            "Курс": ["92.5", "93.1"],
            "Комментарий (from Ордер)": "срочно"
        });
        let rec = normalize(&raw);
        assert_eq!(rec.date, DateField::Parsed(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
        assert_eq!(rec.sender, "Иванов");
        assert_eq!(rec.receiver, "Петров");
        assert_eq!(rec.currency, Some(Currency::Usd));
        assert_eq!(rec.amount(Currency::Usd), Some(100.0));
        assert_eq!(rec.cash_amount(Currency::Usd), Some(40.0));
        assert_eq!(rec.amount(Currency::Rub), None);
        assert_eq!(rec.primary_amount(), 100.0);
        assert_eq!(rec.rate, "92.5; 93.1");
        assert_eq!(rec.comment, "срочно");
    }

    #[test]
    fn test_missing_fields_all_default() {
        let rec = normalize(&json!({}));
        assert_eq!(rec.date, DateField::Raw(String::new()));
        assert_eq!(rec.raw_date, "");
        assert_eq!(rec.sender, "");
        assert_eq!(rec.currency, None);
        assert_eq!(rec.primary_amount(), 0.0);
        for currency in Currency::ALL {
            assert_eq!(rec.amount(currency), None);
            assert_eq!(rec.cash_amount(currency), None);
        }
    }

    #[test]
    fn test_non_object_record_defaults() {
        let rec = normalize(&json!(null));
        assert_eq!(rec.raw_date, "");
        assert_eq!(rec.primary_amount(), 0.0);
    }

    #[test]
    fn test_invalid_date_falls_back_to_raw_text() {
        let rec = normalize(&json!({"Дата": "not-a-date"}));
        assert_eq!(rec.date, DateField::Raw("not-a-date".to_string()));
        assert_eq!(rec.raw_date, "not-a-date");
    }

    #[test]
    fn test_date_format_variants() {
        for text in ["2025-01-02", "02.01.2025", "2025-01-02T10:30:00+03:00"] {
            let rec = normalize(&json!({ "Дата": text }));
            assert_eq!(
                rec.date.parsed(),
                Some(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_pre_normalized_scalars_accepted() {
        // Idempotence: plain strings where arrays are expected
        let raw = json!({
            "Отправитель": "Иванов",
            "Валюта": "USD",
            "Курс": "92.5"
        });
        let rec = normalize(&raw);
        assert_eq!(rec.sender, "Иванов");
        assert_eq!(rec.currency, Some(Currency::Usd));
        assert_eq!(rec.rate, "92.5");
    }

    #[test]
    fn test_unknown_currency_uses_order_amount() {
        let rec = normalize(&json!({
            "Валюта": {"name": "GBP"},
            "Сумма_Ордер": [42.0]
        }));
        assert_eq!(rec.currency, None);
        assert_eq!(rec.currency_name, "GBP");
        assert_eq!(rec.primary_amount(), 42.0);
    }

    #[test]
    fn test_scalar_order_amount() {
        let rec = normalize(&json!({ "Сумма_Ордер": 17.5 }));
        assert_eq!(rec.primary_amount(), 17.5);
    }

    #[test]
    fn test_zero_amount_counts_as_absent() {
        // A zero breakdown amount leaves its column unwritten
        let rec = normalize(&json!({ "Сумма RUB": 0.0, "Сумма USD КЕШ": 0 }));
        assert_eq!(rec.amount(Currency::Rub), None);
        assert_eq!(rec.cash_amount(Currency::Usd), None);
    }

    #[test]
    fn test_numeric_strings_parse() {
        let rec = normalize(&json!({ "Сумма USD": "125.50" }));
        assert_eq!(rec.amount(Currency::Usd), Some(125.5));
    }

    #[test]
    fn test_mixed_currency_record() {
        let rec = normalize(&json!({
            "Валюта": {"name": "RUB"},
            "Сумма RUB": 1000.0,
            "Сумма USD КЕШ": 50.0,
            "Сумма CNY": 200.0
        }));
        assert_eq!(rec.primary_amount(), 1000.0);
        assert_eq!(rec.amount(Currency::Cny), Some(200.0));
        assert_eq!(rec.cash_amount(Currency::Usd), Some(50.0));
    }
}
