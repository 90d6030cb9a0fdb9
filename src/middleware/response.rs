use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

pub const OK_MESSAGE: &str = "Success";
pub const CREATED_MESSAGE: &str = "Resource created successfully";

/// Wrapper for API responses that adds the `{success, message, data?}` envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub message: String,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with the default message
    pub fn success(data: T) -> Self {
        Self::with_status(data, StatusCode::OK, OK_MESSAGE)
    }

    pub fn with_status(data: T, status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            message: message.into(),
            status_code,
        }
    }

    /// 201 Created
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED, CREATED_MESSAGE)
    }
}

impl ApiResponse<()> {
    /// Envelope without a `data` member.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: message.into(),
            status_code: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let mut envelope = json!({
            "success": true,
            "message": self.message,
        });

        if let Some(data) = &self.data {
            match serde_json::to_value(data) {
                Ok(Value::Null) => {}
                Ok(value) => envelope["data"] = value,
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return crate::error::ApiError::internal_server_error("Internal server error").into_response();
                }
            }
        }

        (self.status_code, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
