// handlers/protected/records/balance.rs - POST /records/balance

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::AppState;
use crate::database::models::{Metadata, NewRecord, RecordKind, RecordView};
use crate::error::{ApiError, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{IntakeEvent, IntakeKind};

use super::input;

const INVALID_BALANCE: &str = "Please provide a valid balance amount";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRequest {
    pub balance_amount: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub message: &'static str,
    pub record: RecordView,
}

/// POST /records/balance - Manually entered account balance; zero is allowed,
/// negative values are not.
pub async fn post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<BalanceRequest>, JsonRejection>,
) -> ApiResult<BalanceResponse> {
    let Json(payload) = payload?;

    let balance_amount = match input::amount("balanceAmount", payload.balance_amount.as_ref()) {
        Ok(Some(amount)) if amount.is_sign_negative() && !amount.is_zero() => {
            return Err(invalid_balance("Must be zero or greater"));
        }
        Ok(Some(amount)) => amount,
        Ok(None) => return Err(ApiError::missing_fields(INVALID_BALANCE, &["balanceAmount"])),
        Err(_) => return Err(invalid_balance("Must be a number")),
    };

    let record = state
        .store
        .create(
            NewRecord::new(auth_user.user_id, RecordKind::Balance { balance_amount }).metadata(
                Metadata::new()
                    .with("source", "manual_entry")
                    .with("addedBy", auth_user.username.as_str()),
            ),
        )
        .await?;

    tracing::info!("Stored balance {} for {}", record.id, auth_user.username);

    state.webhook.forward(IntakeEvent {
        event: IntakeKind::BalanceAdded,
        user_id: auth_user.user_id,
        username: auth_user.username,
        file_name: None,
        records: vec![RecordView::from(&record)],
    });

    Ok(ApiResponse::created(BalanceResponse {
        message: "Balance entry added successfully",
        record: RecordView::receipt(&record),
    }))
}

fn invalid_balance(reason: &str) -> ApiError {
    ApiError::validation_error(
        INVALID_BALANCE,
        Some(FieldErrors::from([("balanceAmount".to_string(), reason.to_string())])),
    )
}
