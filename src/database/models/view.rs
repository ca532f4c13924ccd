use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::record::{FinancialRecord, RecordType};

/// Client-facing projection of a record. Never carries the owner or metadata;
/// fields that do not apply to the record type are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    pub id: Uuid,
    pub record_type: RecordType,
    #[serde(with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub balance_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl RecordView {
    /// Intake acknowledgement shape: the listing projection minus the file name.
    pub fn receipt(record: &FinancialRecord) -> Self {
        Self {
            file_name: None,
            ..Self::from(record)
        }
    }
}

impl From<&FinancialRecord> for RecordView {
    fn from(record: &FinancialRecord) -> Self {
        Self {
            id: record.id,
            record_type: record.record_type(),
            amount: record.amount(),
            payee: record.payee().map(str::to_string),
            purpose: record.purpose().map(str::to_string),
            due_date: record.due_date(),
            balance_amount: record.balance_amount(),
            file_name: record.file_name.clone(),
            uploaded_at: record.uploaded_at,
        }
    }
}

/// Per-transaction acknowledgement returned by statement intake.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: Uuid,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    pub payee: Option<String>,
    pub purpose: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&FinancialRecord> for TransactionView {
    fn from(record: &FinancialRecord) -> Self {
        Self {
            id: record.id,
            amount: record.amount(),
            payee: record.payee().map(str::to_string),
            purpose: record.purpose().map(str::to_string),
            uploaded_at: record.uploaded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{NewRecord, RecordKind};
    use serde_json::json;

    #[test]
    fn balance_projection_omits_unrelated_fields() {
        let record = NewRecord::new(
            Uuid::new_v4(),
            RecordKind::Balance {
                balance_amount: Decimal::new(250075, 2),
            },
        )
        .into_record(Utc::now())
        .unwrap();

        let value = serde_json::to_value(RecordView::from(&record)).unwrap();

        assert_eq!(value["recordType"], "BALANCE");
        assert_eq!(value["balanceAmount"], json!(2500.75));
        assert!(value.get("amount").is_none());
        assert!(value.get("dueDate").is_none());
        assert!(value.get("userId").is_none());
        assert!(value.get("metadata").is_none());
    }

    #[test]
    fn invoice_receipt_renders_plain_due_date() {
        let record = NewRecord::new(
            Uuid::new_v4(),
            RecordKind::Invoice {
                amount: Decimal::new(12050, 2),
                payee: "ACME".to_string(),
                purpose: "hosting".to_string(),
                due_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            },
        )
        .file_name(Some("acme.pdf".to_string()))
        .into_record(Utc::now())
        .unwrap();

        let value = serde_json::to_value(RecordView::receipt(&record)).unwrap();

        assert_eq!(value["dueDate"], "2024-06-01");
        assert_eq!(value["amount"], json!(120.5));
        assert!(value.get("fileName").is_none());
    }

    #[test]
    fn transaction_view_keeps_absent_text_as_null() {
        let record = NewRecord::new(
            Uuid::new_v4(),
            RecordKind::Transaction {
                amount: Decimal::from(-12),
                payee: None,
                purpose: Some("coffee".to_string()),
            },
        )
        .into_record(Utc::now())
        .unwrap();

        let value = serde_json::to_value(TransactionView::from(&record)).unwrap();

        assert_eq!(value["amount"], json!(-12.0));
        assert_eq!(value["payee"], serde_json::Value::Null);
        assert_eq!(value["purpose"], "coffee");
    }
}
