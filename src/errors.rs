use crate::services::ServiceError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether error responses include the raw internal detail. Enabled outside
/// production so 500s stay diagnosable without leaking internals in prod.
static EXPOSE_DETAIL: AtomicBool = AtomicBool::new(false);

pub fn set_expose_detail(expose: bool) {
    EXPOSE_DETAIL.store(expose, Ordering::Relaxed);
}

fn expose_detail() -> bool {
    EXPOSE_DETAIL.load(Ordering::Relaxed)
}

/// A lightweight wrapper for request errors that keeps the message local.
///
/// Serializes as `{"success": false, "message": ..., "error": ...}` where
/// `error` carries the internal detail and is only present when detail
/// exposure is on.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<String>,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            detail: None,
        }
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 401 Unauthorized
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for a 500 Internal Server Error with an internal detail.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error.".into(),
            detail: Some(detail.into()),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = self.status.as_u16(),
                detail = self.detail.as_deref().unwrap_or(""),
                "request failed: {}",
                self.message
            );
        }

        let body = match self.detail.filter(|_| expose_detail()) {
            Some(detail) => Json(json!({
                "success": false,
                "message": self.message,
                "error": detail,
            })),
            None => Json(json!({
                "success": false,
                "message": self.message,
            })),
        };

        (self.status, body).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            ServiceError::Authorization(msg) => Self::new(StatusCode::FORBIDDEN, msg),
            ServiceError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            ServiceError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            ServiceError::Sqlx(err) => Self::internal(err.to_string()),
            ServiceError::Internal(detail) => Self::internal(detail),
        }
    }
}
