use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::auth_service::{LoginRequest, LoginResponse, RegisterRequest};

/// POST /auth/register
///
/// Body: `{firstName, lastName, email, password, phoneNumber?, avatar?}`.
/// Responds 201 with the new user, 422 with per-field `errors`, or 409 when
/// the email is taken.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Json(request) = payload?;
    let user = state.auth.register(request).await?;
    Ok(ApiResponse::created(user))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(request) = payload?;
    let response = state.auth.login(request).await?;
    Ok(ApiResponse::success(response))
}
