use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::metadata::Metadata;

/// Validation failures raised before a record reaches storage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Unknown record type: {0}")]
    UnknownRecordType(String),
}

impl RecordError {
    pub fn missing(field: impl Into<String>) -> Self {
        RecordError::MissingRequiredField(field.into())
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RecordError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field, if the error is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            RecordError::MissingRequiredField(field) => Some(field),
            RecordError::InvalidField { field, .. } => Some(field),
            RecordError::UnknownRecordType(_) => Some("recordType"),
        }
    }
}

/// Discriminator of a financial record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    Invoice,
    Balance,
    Transaction,
}

impl RecordType {
    pub const ALL: [RecordType; 3] = [RecordType::Invoice, RecordType::Balance, RecordType::Transaction];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Invoice => "INVOICE",
            RecordType::Balance => "BALANCE",
            RecordType::Transaction => "TRANSACTION",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = RecordError;

    /// Case-insensitive; `invoice`, `Invoice` and `INVOICE` are the same type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| RecordError::UnknownRecordType(s.to_string()))
    }
}

/// Variant-specific fields. Each variant carries exactly the fields its
/// record type requires, so an invoice without a due date cannot be built.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordKind {
    Invoice {
        amount: Decimal,
        payee: String,
        purpose: String,
        due_date: NaiveDate,
    },
    Balance {
        balance_amount: Decimal,
    },
    Transaction {
        amount: Decimal,
        payee: Option<String>,
        purpose: Option<String>,
    },
}

impl RecordKind {
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordKind::Invoice { .. } => RecordType::Invoice,
            RecordKind::Balance { .. } => RecordType::Balance,
            RecordKind::Transaction { .. } => RecordType::Transaction,
        }
    }

    /// Trim text fields; required text that ends up blank is missing, optional
    /// text that ends up blank is dropped.
    fn normalized(self) -> Result<Self, RecordError> {
        match self {
            RecordKind::Invoice {
                amount,
                payee,
                purpose,
                due_date,
            } => Ok(RecordKind::Invoice {
                amount,
                payee: required_text("payee", payee)?,
                purpose: required_text("purpose", purpose)?,
                due_date,
            }),
            RecordKind::Balance { balance_amount } => Ok(RecordKind::Balance { balance_amount }),
            RecordKind::Transaction {
                amount,
                payee,
                purpose,
            } => Ok(RecordKind::Transaction {
                amount,
                payee: optional_text(payee),
                purpose: optional_text(purpose),
            }),
        }
    }
}

/// A record as submitted for persistence; `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub user_id: Uuid,
    pub kind: RecordKind,
    pub file_name: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub metadata: Metadata,
}

impl NewRecord {
    pub fn new(user_id: Uuid, kind: RecordKind) -> Self {
        Self {
            user_id,
            kind,
            file_name: None,
            uploaded_at: None,
            metadata: Metadata::new(),
        }
    }

    pub fn file_name(mut self, file_name: Option<String>) -> Self {
        self.file_name = file_name;
        self
    }

    pub fn uploaded_at(mut self, uploaded_at: DateTime<Utc>) -> Self {
        self.uploaded_at = Some(uploaded_at);
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Validate and turn into a stored record. `now` is used when no upload
    /// time was supplied.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<FinancialRecord, RecordError> {
        if self.user_id.is_nil() {
            return Err(RecordError::missing("userId"));
        }

        Ok(FinancialRecord {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            kind: self.kind.normalized()?,
            file_name: optional_text(self.file_name),
            uploaded_at: self.uploaded_at.unwrap_or(now),
            metadata: self.metadata,
        })
    }
}

/// A persisted financial record. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: RecordKind,
    pub file_name: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub metadata: Metadata,
}

impl FinancialRecord {
    pub fn record_type(&self) -> RecordType {
        self.kind.record_type()
    }

    pub fn amount(&self) -> Option<Decimal> {
        match &self.kind {
            RecordKind::Invoice { amount, .. } | RecordKind::Transaction { amount, .. } => Some(*amount),
            RecordKind::Balance { .. } => None,
        }
    }

    pub fn payee(&self) -> Option<&str> {
        match &self.kind {
            RecordKind::Invoice { payee, .. } => Some(payee),
            RecordKind::Transaction { payee, .. } => payee.as_deref(),
            RecordKind::Balance { .. } => None,
        }
    }

    pub fn purpose(&self) -> Option<&str> {
        match &self.kind {
            RecordKind::Invoice { purpose, .. } => Some(purpose),
            RecordKind::Transaction { purpose, .. } => purpose.as_deref(),
            RecordKind::Balance { .. } => None,
        }
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        match &self.kind {
            RecordKind::Invoice { due_date, .. } => Some(*due_date),
            _ => None,
        }
    }

    pub fn balance_amount(&self) -> Option<Decimal> {
        match &self.kind {
            RecordKind::Balance { balance_amount } => Some(*balance_amount),
            _ => None,
        }
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (date part in UTC).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
}

fn required_text(field: &str, value: String) -> Result<String, RecordError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RecordError::missing(field));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
