// handlers/protected/records/invoice.rs - POST /records/invoice

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::AppState;
use crate::database::models::{Metadata, NewRecord, RecordKind, RecordView};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{IntakeEvent, IntakeKind};

use super::input;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    pub amount: Option<Value>,
    pub payee: Option<String>,
    pub purpose: Option<String>,
    pub due_date: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub message: &'static str,
    pub record: RecordView,
}

/**
 * POST /records/invoice - Store the extracted fields of an uploaded invoice
 *
 * Expected Input:
 * ```json
 * {
 *   "amount": 120.5,            // number or numeric string, must not be 0
 *   "payee": "ACME Ltd",
 *   "purpose": "Hosting",
 *   "dueDate": "2024-06-01",
 *   "fileName": "acme-june.pdf" // optional
 * }
 * ```
 *
 * Every missing field is reported in `fieldErrors`; nothing is stored
 * unless all four are present.
 */
pub async fn post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<InvoiceRequest>, JsonRejection>,
) -> ApiResult<InvoiceResponse> {
    let Json(payload) = payload?;

    // A zero amount is as good as no amount for an invoice
    let amount = input::amount("amount", payload.amount.as_ref())?.filter(|a| !a.is_zero());
    let payee = input::text(payload.payee);
    let purpose = input::text(payload.purpose);
    let due_date = input::date("dueDate", payload.due_date.as_deref())?;

    let (amount, payee, purpose, due_date) = match (amount, payee, purpose, due_date) {
        (Some(amount), Some(payee), Some(purpose), Some(due_date)) => (amount, payee, purpose, due_date),
        (amount, payee, purpose, due_date) => {
            let missing: Vec<&str> = [
                ("amount", amount.is_some()),
                ("payee", payee.is_some()),
                ("purpose", purpose.is_some()),
                ("dueDate", due_date.is_some()),
            ]
            .into_iter()
            .filter(|(_, present)| !present)
            .map(|(field, _)| field)
            .collect();

            return Err(ApiError::missing_fields(
                "Please provide all required fields: amount, payee, purpose, dueDate",
                &missing,
            ));
        }
    };

    let file_name = input::text(payload.file_name);
    let record = state
        .store
        .create(
            NewRecord::new(
                auth_user.user_id,
                RecordKind::Invoice {
                    amount,
                    payee,
                    purpose,
                    due_date,
                },
            )
            .file_name(file_name.clone())
            .metadata(
                Metadata::new()
                    .with("source", "invoice_upload")
                    .with("uploadedBy", auth_user.username.as_str()),
            ),
        )
        .await?;

    tracing::info!("Stored invoice {} for {}", record.id, auth_user.username);

    state.webhook.forward(IntakeEvent {
        event: IntakeKind::InvoiceUploaded,
        user_id: auth_user.user_id,
        username: auth_user.username,
        file_name,
        records: vec![RecordView::from(&record)],
    });

    Ok(ApiResponse::created(InvoiceResponse {
        message: "Invoice uploaded successfully",
        record: RecordView::receipt(&record),
    }))
}
