use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// User-facing error message constants, kept in one place so handlers and
/// tests agree on wording.
pub mod msg {
    pub const ALREADY_PRO: &str = "Account already has PRO access";
    pub const INVALID_PROVIDER: &str = "Unknown payment provider";
    pub const PROVIDER_NOT_CONFIGURED: &str = "Payment provider not configured";
    pub const SIMULATION_DISABLED: &str = "Simulation provider is only available in dev mode";
    pub const USER_NOT_FOUND: &str = "User not found";
    pub const PAYMENT_NOT_FOUND: &str = "Payment not found";
    pub const PAYMENT_NOT_YOURS: &str = "Payment is not attributed to this account";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Network or auth failure talking to a payment provider. Not retried
    /// server-side; the client may restart the checkout.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Order is not in a capturable state. The provider's reported state is
    /// included so the client can distinguish "not yet approved" from other
    /// conflicts.
    #[error("Capture conflict: order state is {0}")]
    CaptureConflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<StatusCode> for AppError {
    fn from(code: StatusCode) -> Self {
        match code {
            StatusCode::UNAUTHORIZED => AppError::Unauthorized,
            StatusCode::FORBIDDEN => AppError::Forbidden("Access denied".into()),
            StatusCode::NOT_FOUND => AppError::NotFound("Resource not found".into()),
            _ => AppError::Internal(format!("Status: {}", code)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone()))
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", Some(msg.clone())),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),
            AppError::ProviderUnavailable(msg) => {
                tracing::error!("Provider unavailable: {}", msg);
                (StatusCode::BAD_GATEWAY, "Payment provider unavailable", None)
            }
            AppError::CaptureConflict(state) => (
                StatusCode::BAD_REQUEST,
                "Payment not capturable",
                Some(format!("Provider reports order state: {}", state)),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Extension trait to turn `Ok(None)` lookups into `NotFound` errors.
pub trait OptionExt<T> {
    fn or_not_found(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(msg.to_string()))
    }
}
