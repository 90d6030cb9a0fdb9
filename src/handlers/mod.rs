//! HTTP handlers, split by access tier.
//!
//! Public handlers need no credentials. Protected handlers sit behind
//! [`jwt_auth_middleware`](crate::middleware::jwt_auth_middleware) and may
//! read the [`AuthUser`](crate::middleware::AuthUser) it inserts.

pub mod protected;
pub mod public;

use crate::error::ApiError;

/// Fallback for unmatched routes.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
