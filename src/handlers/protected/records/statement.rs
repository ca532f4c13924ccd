// handlers/protected/records/statement.rs - POST /records/statement

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::AppState;
use crate::database::models::{
    MetaValue, Metadata, NewRecord, RecordKind, RecordView, TransactionView,
};
use crate::error::{ApiError, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{IntakeEvent, IntakeKind};

use super::input;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementRequest {
    pub transactions: Option<Value>,
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatementResponse {
    pub message: &'static str,
    /// Number of stored transactions
    pub records: usize,
    pub transactions: Vec<TransactionView>,
}

/**
 * POST /records/statement - Store the transactions extracted from a bank statement
 *
 * Expected Input:
 * ```json
 * {
 *   "transactions": [
 *     { "amount": -4.5, "payee": "Cafe", "description": "coffee", "date": "2024-03-01", "type": "debit" }
 *   ],
 *   "fileName": "march.pdf"
 * }
 * ```
 *
 * The batch is stored as a whole: one bad entry rejects every entry.
 */
pub async fn post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<StatementRequest>, JsonRejection>,
) -> ApiResult<StatementResponse> {
    let Json(payload) = payload?;

    let entries = match payload.transactions {
        Some(Value::Array(entries)) if !entries.is_empty() => entries,
        _ => {
            return Err(ApiError::validation_error(
                "Please provide valid transaction data",
                Some(FieldErrors::from([(
                    "transactions".to_string(),
                    "Must be a non-empty list".to_string(),
                )])),
            ))
        }
    };

    let file_name = input::text(payload.file_name);
    let mut field_errors = FieldErrors::new();
    let mut batch = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let field = |name: &str| format!("transactions[{}].{}", index, name);

        let Value::Object(entry) = entry else {
            field_errors.insert(format!("transactions[{}]", index), "Must be an object".to_string());
            continue;
        };

        let amount = match input::amount(&field("amount"), entry.get("amount")) {
            Ok(Some(amount)) => amount,
            Ok(None) => {
                field_errors.insert(field("amount"), "This field is required".to_string());
                continue;
            }
            Err(e) => {
                field_errors.insert(field("amount"), e.to_string());
                continue;
            }
        };

        let mut metadata = Metadata::new()
            .with("source", "bank_statement")
            .with("uploadedBy", auth_user.username.as_str());
        if let Some(date) = input::scalar_text(entry.get("date")) {
            metadata.insert("transactionDate", MetaValue::from_text(&date));
        }
        if let Some(kind) = input::scalar_text(entry.get("type")) {
            metadata.insert("transactionType", kind);
        }

        batch.push(
            NewRecord::new(
                auth_user.user_id,
                RecordKind::Transaction {
                    amount,
                    payee: input::scalar_text(entry.get("payee")),
                    purpose: input::scalar_text(entry.get("description")),
                },
            )
            .file_name(file_name.clone())
            .metadata(metadata),
        );
    }

    if !field_errors.is_empty() {
        return Err(ApiError::validation_error(
            "Please provide valid transaction data",
            Some(field_errors),
        ));
    }

    let records = state.store.create_many(batch).await?;

    tracing::info!(
        "Stored {} statement transactions for {}",
        records.len(),
        auth_user.username
    );

    state.webhook.forward(IntakeEvent {
        event: IntakeKind::StatementUploaded,
        user_id: auth_user.user_id,
        username: auth_user.username,
        file_name,
        records: records.iter().map(RecordView::from).collect(),
    });

    Ok(ApiResponse::created(StatementResponse {
        message: "Bank statement processed successfully",
        records: records.len(),
        transactions: records.iter().map(TransactionView::from).collect(),
    }))
}
