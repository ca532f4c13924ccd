use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::database::models::{parse_date, RecordError};

/// Read a money amount sent either as a JSON number or a numeric string.
/// `null`, absent and blank strings are `None`.
pub fn amount(field: &str, value: Option<&Value>) -> Result<Option<Decimal>, RecordError> {
    let invalid = || RecordError::invalid(field, "Must be a number");

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => parse_decimal(&n.to_string()).map(Some).ok_or_else(invalid),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => parse_decimal(s.trim()).map(Some).ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}

/// Read a date in `YYYY-MM-DD` or RFC 3339 form; blank is `None`.
pub fn date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, RecordError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| RecordError::invalid(field, "Must be a date (YYYY-MM-DD)")),
    }
}

/// Trimmed text, `None` when absent or blank.
pub fn text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Scalars rendered as text; objects, arrays and blanks are `None`.
pub fn scalar_text(value: Option<&Value>) -> Option<String> {
    let raw = match value? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    text(Some(raw))
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    raw.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(raw).ok())
}
