use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::record::parse_date;

/// Keys whose stored text is read back as a calendar date.
pub const DATE_KEYS: &[&str] = &["transactionDate"];

/// A single provenance value. Deliberately limited to scalars so the stored
/// document stays checkable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl MetaValue {
    /// Interpret free text from a client, keeping dates as dates.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        match parse_date(trimmed) {
            Some(date) => MetaValue::Date(date),
            None => MetaValue::Text(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Number(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

impl From<NaiveDate> for MetaValue {
    fn from(value: NaiveDate) -> Self {
        MetaValue::Date(value)
    }
}

/// Scalar as it appears in stored JSON, before dates are recognised.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Free-form provenance attached to a record (source tag, uploader, original
/// transaction date/type).
///
/// Dates are serialized as `YYYY-MM-DD` text, so only [DATE_KEYS] are parsed
/// back into [MetaValue::Date]; every other string stays text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, MetaValue>);

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = BTreeMap::<String, StoredValue>::deserialize(deserializer)?;

        let values = stored
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    StoredValue::Bool(b) => MetaValue::Bool(b),
                    StoredValue::Number(n) => MetaValue::Number(n),
                    StoredValue::Text(text) if DATE_KEYS.contains(&key.as_str()) => {
                        match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                            Ok(date) => MetaValue::Date(date),
                            Err(_) => MetaValue::Text(text),
                        }
                    }
                    StoredValue::Text(text) => MetaValue::Text(text),
                };
                (key, value)
            })
            .collect();

        Ok(Metadata(values))
    }
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_that_looks_like_a_date_becomes_a_date() {
        assert_eq!(
            MetaValue::from_text(" 2024-03-01 "),
            MetaValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(MetaValue::from_text("debit"), MetaValue::Text("debit".to_string()));
    }

    #[test]
    fn metadata_serializes_as_a_flat_object() {
        let metadata = Metadata::new()
            .with("source", "bank_statement")
            .with("transactionDate", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .with("verified", true);

        let value = serde_json::to_value(&metadata).unwrap();

        assert_eq!(
            value,
            json!({
                "source": "bank_statement",
                "transactionDate": "2024-03-01",
                "verified": true
            })
        );
    }

    #[test]
    fn metadata_reads_back_from_stored_json() {
        let stored = json!({ "source": "manual_entry", "pages": 3.0, "flag": false });

        let metadata: Metadata = serde_json::from_value(stored).unwrap();

        assert_eq!(metadata.get("source").and_then(MetaValue::as_str), Some("manual_entry"));
        assert_eq!(metadata.get("pages"), Some(&MetaValue::Number(3.0)));
        assert_eq!(metadata.get("flag"), Some(&MetaValue::Bool(false)));
    }

    #[test]
    fn date_like_text_outside_date_keys_stays_text() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let metadata = Metadata::new()
            .with("uploadedBy", "2024-01-01")
            .with("transactionType", "2024-02-02")
            .with("transactionDate", date);

        let restored: Metadata = serde_json::from_value(serde_json::to_value(&metadata).unwrap()).unwrap();

        assert_eq!(restored, metadata);
        assert_eq!(restored.get("uploadedBy").and_then(MetaValue::as_str), Some("2024-01-01"));
        assert_eq!(restored.get("transactionDate"), Some(&MetaValue::Date(date)));
    }

    #[test]
    fn unreadable_stored_date_stays_text() {
        let metadata: Metadata = serde_json::from_value(json!({ "transactionDate": "last week" })).unwrap();

        assert_eq!(metadata.get("transactionDate"), Some(&MetaValue::from("last week")));
    }
}
