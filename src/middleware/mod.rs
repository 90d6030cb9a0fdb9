pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod response;
pub mod security;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use cors::cors_layer;
pub use rate_limit::{rate_limit_middleware, RateLimiter};
pub use response::{ApiResponse, ApiResult};
pub use security::with_security_headers;
