use axum::{
    extract::{RawQuery, State},
    Extension,
};

use crate::database::models::ProductListItem;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::query::{PagedResult, QueryParams};
use crate::server::AppState;

/// GET /products/all
///
/// Accepts `sortBy`, `sortOrder`, `page`, `limit`, `search`, `categoryId`,
/// `minPrice`, `maxPrice` and `isActive`. Unrecognized or malformed values
/// fall back to defaults rather than failing the request.
pub async fn list_all(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    RawQuery(raw): RawQuery,
) -> ApiResult<PagedResult<ProductListItem>> {
    let query = QueryParams::parse(raw.as_deref().unwrap_or_default());
    tracing::debug!(user_id = %user.user_id, params = query.len(), "product listing requested");

    let page = state.products.list(&query).await?;
    Ok(ApiResponse::success(page))
}
