// handlers/protected/auth.rs - GET /auth/me

use axum::extract::{Extension, State};
use serde::Serialize;

use crate::app::AppState;
use crate::database::models::UserView;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserView,
}

/// GET /auth/me - Public view of the authenticated user
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<MeResponse> {
    let user = state
        .store
        .find_user_by_id(auth_user.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    Ok(ApiResponse::success(MeResponse {
        user: UserView::from(&user),
    }))
}
