//! Decimal amounts from upstream JSON into minor units

use serde_json::Value;
use spendledger_domain::{LedgerError, Result};

/// Convert a decimal amount (`45.99`, `"1200.5"`, `-3`) into cents.
///
/// Parsed from the decimal text so no binary float rounding is involved.
/// More than two fractional digits round half away from zero.
pub fn minor_units(value: &Value) -> Result<i64> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(raw) => raw.trim().to_string(),
        other => {
            return Err(LedgerError::InvalidInput(format!("amount is not a number: {other}")));
        }
    };
    parse_decimal(&text)
}

fn parse_decimal(text: &str) -> Result<i64> {
    let invalid = || LedgerError::InvalidInput(format!("unparseable amount '{text}'"));

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
    let mut cents_digits: Vec<i64> =
        fraction.chars().filter_map(|c| c.to_digit(10)).map(i64::from).collect();
    let round_up = cents_digits.get(2).is_some_and(|digit| *digit >= 5);
    cents_digits.resize(2, 0);

    let mut cents = whole
        .checked_mul(100)
        .and_then(|value| value.checked_add(cents_digits[0] * 10 + cents_digits[1]))
        .ok_or_else(invalid)?;
    if round_up {
        cents = cents.checked_add(1).ok_or_else(invalid)?;
    }

    Ok(if negative { -cents } else { cents })
}
