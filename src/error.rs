use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::ApiResponse;
use crate::services::token::TokenError;
use crate::session::store::SessionError;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// The request header or body could not be decoded.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Any authentication failure. The reason is logged, never returned.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The authenticated account may not touch the resource.
    #[error("Forbidden")]
    Forbidden,

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// A uniqueness conflict.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The session cache failed or timed out.
    #[error("Session unavailable: {0}")]
    SessionUnavailable(String),

    /// The request deadline elapsed.
    #[error("Request timed out")]
    Timeout,

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Shorthand for an authentication rejection with a server-side reason.
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        AppError::Unauthorized(reason.into())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(e) => AppError::Internal(format!("token signing failed: {}", e)),
            TokenError::LifetimeOutOfRange => {
                AppError::Internal("token lifetime out of range".to_string())
            }
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => AppError::Unauthorized("session not found".to_string()),
            SessionError::Corrupted(reason) => {
                AppError::Internal(format!("session corrupted: {}", reason))
            }
            SessionError::Encode(reason) => {
                AppError::Internal(format!("session encoding failed: {}", reason))
            }
            SessionError::Write(reason) | SessionError::Read(reason) => {
                AppError::SessionUnavailable(reason)
            }
            SessionError::Timeout => AppError::SessionUnavailable("cache timeout".to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Pool(ref e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::MalformedRequest(ref msg) => {
                tracing::debug!("Malformed request: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::UNPROCESSABLE_ENTITY, msg.clone())
            }

            AppError::Unauthorized(ref reason) => {
                tracing::warn!("Authentication rejected: {}", reason);
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }

            AppError::Forbidden => {
                tracing::warn!("Authorization failed");
                (StatusCode::FORBIDDEN, "Forbidden".to_string())
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }

            AppError::Conflict(ref msg) => {
                tracing::debug!("Conflict: {}", msg);
                (StatusCode::CONFLICT, msg.clone())
            }

            AppError::SessionUnavailable(ref msg) => {
                tracing::error!("Session store unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "Session store unavailable".to_string())
            }

            AppError::Timeout => {
                tracing::warn!("Request deadline exceeded");
                (StatusCode::GATEWAY_TIMEOUT, "Request timed out".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        ApiResponse::<()>::error(message).into_response_with(status)
    }
}
