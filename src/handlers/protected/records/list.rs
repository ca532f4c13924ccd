// handlers/protected/records/list.rs - GET /records

use axum::extract::{rejection::QueryRejection, Extension, Query, State};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::{RecordType, RecordView};
use crate::database::{Page, Pagination, RecordFilter};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Case-insensitive record type; blank means every type
    pub record_type: Option<String>,
    /// Blank or unreadable values fall back to the defaults
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListQuery {
    fn page(&self) -> Option<i64> {
        lenient_number(self.page.as_deref())
    }

    fn limit(&self) -> Option<i64> {
        lenient_number(self.limit.as_deref())
    }
}

fn lenient_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}

#[derive(Debug, Serialize)]
pub struct PaginationView {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u64,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub records: Vec<RecordView>,
    pub pagination: PaginationView,
}

impl From<Page<RecordView>> for ListResponse {
    fn from(page: Page<RecordView>) -> Self {
        Self {
            pagination: PaginationView {
                total: page.total,
                page: page.page,
                limit: page.limit,
                pages: page.pages(),
            },
            records: page.items,
        }
    }
}

/// GET /records?recordType=&page=&limit= - Newest-first page of the caller's records
pub async fn get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<ListResponse> {
    let Query(query) = query?;
    let api = &state.config.api;

    let page = query.page().unwrap_or(1).clamp(1, i64::from(u32::MAX)) as u32;
    let limit = query
        .limit()
        .unwrap_or(i64::from(api.default_page_limit))
        .clamp(1, i64::from(api.max_page_limit)) as u32;
    let pagination = Pagination::new(page, limit, api.max_page_limit);

    let filter = match query.record_type.as_deref().map(str::trim) {
        None | Some("") => RecordFilter::default(),
        Some(raw) => match raw.parse::<RecordType>() {
            Ok(record_type) => RecordFilter::of_type(record_type),
            // No record can carry an unknown type
            Err(_) => return Ok(ApiResponse::success(ListResponse::from(Page::empty(pagination)))),
        },
    };

    let page = state.store.find(auth_user.user_id, filter, pagination).await?;

    Ok(ApiResponse::success(ListResponse::from(Page {
        items: page.items.iter().map(RecordView::from).collect(),
        total: page.total,
        page: page.page,
        limit: page.limit,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_and_limit_are_read_leniently() {
        assert_eq!(lenient_number(Some(" 3 ")), Some(3));
        assert_eq!(lenient_number(Some("-2")), Some(-2));
        assert_eq!(lenient_number(Some("")), None);
        assert_eq!(lenient_number(Some("abc")), None);
        assert_eq!(lenient_number(None), None);
    }
}
