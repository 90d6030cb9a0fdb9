use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::{extract_bearer, Claims, JwtManager};
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub expires_at: i64,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            expires_at: claims.exp,
        }
    }
}

/// Validates the bearer token and injects [`AuthUser`] into request extensions.
pub async fn jwt_auth_middleware(
    State(jwt): State<JwtManager>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = extract_bearer(header).ok_or_else(|| ApiError::unauthorized("Access denied. No token provided."))?;

    let claims = jwt.validate(token).map_err(|err| {
        tracing::debug!(token = %fingerprint(token), "rejected token: {}", err);
        ApiError::from(err)
    })?;

    let auth_user = AuthUser::from(claims);
    tracing::debug!(user_id = %auth_user.user_id, "authenticated request");
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Short, non-reversible token identifier for logs.
fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}
