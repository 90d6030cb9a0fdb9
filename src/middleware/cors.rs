use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::SecurityConfig;

const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// CORS policy from configuration. `*` reflects the caller's origin so that
/// credentials stay allowed; otherwise only listed origins pass.
pub fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origin = if security.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(security.cors_origins.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| tracing::warn!("ignoring invalid CORS origin {:?}", origin))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, X_REQUESTED_WITH, ACCEPT])
        .allow_credentials(true)
}
