// HTTP API Error Types
use axum::extract::rejection::JsonRejection;
use axum::{http::StatusCode, response::IntoResponse, Json};
use indexmap::IndexMap;
use serde_json::{json, Value};

/// Field name → human-readable problem, in the order fields were checked.
pub type FieldErrors = IndexMap<String, String>;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 422 Unprocessable Entity
    UnprocessableEntity {
        message: String,
        field_errors: FieldErrors,
    },

    // 429 Too Many Requests
    TooManyRequests(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::UnprocessableEntity { .. } => 422,
            ApiError::TooManyRequests(_) => 429,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::UnprocessableEntity { message, .. } => message,
            ApiError::TooManyRequests(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Failure envelope: `{success: false, message, errors?}`
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "success": false,
            "message": self.message(),
        });
        if let ApiError::UnprocessableEntity { field_errors, .. } = self {
            body["errors"] = json!(field_errors);
        }
        body
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unprocessable_entity(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        ApiError::UnprocessableEntity {
            message: message.into(),
            field_errors,
        }
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        ApiError::TooManyRequests(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<crate::database::DatabaseError> for ApiError {
    fn from(err: crate::database::DatabaseError) -> Self {
        match err {
            crate::database::DatabaseError::Conflict(msg) => ApiError::conflict(msg),
            crate::database::DatabaseError::ConnectionError(msg) => {
                tracing::error!("Database connection error: {}", msg);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            crate::database::DatabaseError::Query(err) => {
                // Schema/filter mismatch is a server bug, not a client error
                tracing::error!("Statement build error: {}", err);
                ApiError::internal_server_error("Internal server error")
            }
            crate::database::DatabaseError::Sqlx(sqlx_err) => {
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Internal server error")
            }
            crate::database::DatabaseError::MigrationError(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
        }
    }
}

impl From<crate::query::QueryError> for ApiError {
    fn from(err: crate::query::QueryError) -> Self {
        tracing::error!("Statement build error: {}", err);
        ApiError::internal_server_error("Internal server error")
    }
}

impl From<crate::auth::AuthError> for ApiError {
    fn from(err: crate::auth::AuthError) -> Self {
        match err {
            crate::auth::AuthError::InvalidToken(reason) => ApiError::unauthorized(format!("Invalid token: {}", reason)),
            other => {
                tracing::error!("Auth error: {}", other);
                ApiError::internal_server_error("Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_errors_have_no_errors_field() {
        let body = ApiError::conflict("Email already registered").to_json();
        assert_eq!(body, json!({ "success": false, "message": "Email already registered" }));
    }

    #[test]
    fn validation_errors_are_listed_per_field() {
        let mut fields = FieldErrors::new();
        fields.insert("lastName".into(), "must be between 2 and 50 characters".into());
        fields.insert("email".into(), "must be a valid email address".into());
        let err = ApiError::unprocessable_entity("Unprocessable entity", fields);

        assert_eq!(err.status_code(), 422);
        let body = err.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"]["lastName"], "must be between 2 and 50 characters");
        assert_eq!(body["errors"]["email"], "must be a valid email address");
    }

    #[test]
    fn invalid_token_maps_to_unauthorized() {
        let err: ApiError = crate::auth::AuthError::InvalidToken("ExpiredSignature".into()).into();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.message(), "Invalid token: ExpiredSignature");
    }

    #[test]
    fn statement_errors_are_hidden_from_clients() {
        let err: ApiError = crate::query::QueryError::NotSingleRow("reviews".into()).into();
        assert_eq!(err.status_code(), 500);
        assert!(!err.message().contains("reviews"));
    }
}
