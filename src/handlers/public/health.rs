// handlers/public/health.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - Service description
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Finance Intake API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Invoice, bank statement and balance intake for authenticated users",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "auth": "/auth/register, /auth/login (public), /auth/me (protected)",
            "intake": "/records/invoice, /records/statement, /records/balance (protected)",
            "records": "/records, /records/summary (protected)",
        }
    }))
}

/// GET /health - Liveness plus store connectivity
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
