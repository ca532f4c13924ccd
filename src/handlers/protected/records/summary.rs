// handlers/protected/records/summary.rs - GET /records/summary

use axum::extract::{Extension, State};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::app::AppState;
use crate::database::models::{RecordType, RecordView};
use crate::database::RecordOrder;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

const RECENT_INVOICES: u32 = 5;
const RECENT_TRANSACTIONS: u32 = 10;

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: Summary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(with = "rust_decimal::serde::float")]
    pub current_balance: Decimal,
    pub total_invoices: u64,
    pub total_transactions: u64,
    pub recent_activity: RecentActivity,
}

#[derive(Debug, Serialize)]
pub struct RecentActivity {
    pub invoices: Vec<RecordView>,
    pub transactions: Vec<RecordView>,
}

/// GET /records/summary - Dashboard figures for the caller.
///
/// The reads run concurrently and are not taken from a single snapshot.
pub async fn get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<SummaryResponse> {
    let store = &state.store;
    let user_id = auth_user.user_id;

    let (latest_balance, invoices, transactions, total_invoices, total_transactions) = tokio::try_join!(
        store.find_latest(user_id, RecordType::Balance, RecordOrder::NEWEST_FIRST, 1),
        store.find_latest(user_id, RecordType::Invoice, RecordOrder::SOONEST_DUE, RECENT_INVOICES),
        store.find_latest(
            user_id,
            RecordType::Transaction,
            RecordOrder::NEWEST_FIRST,
            RECENT_TRANSACTIONS
        ),
        store.count(user_id, RecordType::Invoice),
        store.count(user_id, RecordType::Transaction),
    )?;

    let current_balance = latest_balance
        .first()
        .and_then(|record| record.balance_amount())
        .unwrap_or(Decimal::ZERO);

    Ok(ApiResponse::success(SummaryResponse {
        summary: Summary {
            current_balance,
            total_invoices,
            total_transactions,
            recent_activity: RecentActivity {
                invoices: invoices.iter().map(RecordView::from).collect(),
                transactions: transactions.iter().map(RecordView::from).collect(),
            },
        },
    }))
}
