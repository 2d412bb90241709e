//! Unified error handling for the HTTP surface.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::DiscountError;
use crate::shopify::ShopifyError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Discount reconciliation failed.
    #[error("{0}")]
    Discount(#[from] DiscountError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request was well-formed but cannot be processed.
    #[error("{0}")]
    Unprocessable(String),

    /// Signature verification failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("resource".to_string()),
            RepositoryError::Conflict(msg) => Self::BadRequest(msg),
            other => Self::Database(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Shopify(_)
                | Self::Discount(DiscountError::Shopify(_) | DiscountError::Repository(_))
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Shopify(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Discount(err) => match err {
                DiscountError::UnconfirmedIdentity | DiscountError::NoSession(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                DiscountError::Validation(_) => StatusCode::BAD_REQUEST,
                DiscountError::Shopify(_) => StatusCode::BAD_GATEWAY,
                DiscountError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_)
            | Self::Internal(_)
            | Self::Discount(DiscountError::Repository(_)) => "Internal server error".to_string(),
            Self::Shopify(_) | Self::Discount(DiscountError::Shopify(_)) => {
                "External service error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
