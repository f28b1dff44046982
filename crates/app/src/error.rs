//! Unified error handling for the survey app.
//!
//! API endpoints answer with a JSON body `{ "error": ..., "details"?: ... }`;
//! the OAuth endpoints answer with plain text via
//! [`AppError::into_text_response`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::db::RepositoryError;
use crate::services::{InstallError, SurveyError};
use crate::shopify::ShopifyError;

/// Application-level error type for request handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// A configuration value needed by this request is absent.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SurveyError> for AppError {
    fn from(err: SurveyError) -> Self {
        match err {
            SurveyError::MissingFields(_) | SurveyError::InvalidAnswer(_) => {
                Self::BadRequest(err.to_string())
            }
            SurveyError::ShopNotFound(shop) => Self::NotFound(format!("shop {shop}")),
            SurveyError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<InstallError> for AppError {
    fn from(err: InstallError) -> Self {
        match err {
            InstallError::Shopify(e) => Self::Shopify(e),
            InstallError::Repository(e) => Self::Database(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Shopify(ShopifyError::InvalidDomain(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Shopify(_) | Self::Configuration(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short client-facing summary.
    const fn summary(&self) -> &'static str {
        match self {
            Self::Shopify(ShopifyError::InvalidDomain(_)) => "Invalid shop domain",
            Self::BadRequest(_) => "Bad request",
            Self::NotFound(_) => "Not found",
            Self::Shopify(_) => "Shopify request failed",
            Self::Configuration(_) => "Server misconfigured",
            Self::Database(_) | Self::Internal(_) => "Internal server error",
        }
    }

    /// Client-facing detail. Database and internal errors stay server-side.
    fn details(&self) -> Option<String> {
        match self {
            Self::Database(_) | Self::Internal(_) => None,
            Self::Shopify(e) => Some(e.to_string()),
            Self::Configuration(e) => Some(e.to_string()),
            Self::NotFound(msg) | Self::BadRequest(msg) => Some(msg.clone()),
        }
    }

    /// Log server errors and send them to Sentry.
    fn report(&self) {
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }
    }

    /// Render as a plain-text `OAuth error: ...` response.
    #[must_use]
    pub fn into_text_response(self) -> Response {
        self.report();
        let detail = self.details().unwrap_or_else(|| self.summary().to_string());
        let body = format!("OAuth error: {detail}");
        (self.status(), body).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();
        let body = ErrorBody {
            error: self.summary().to_string(),
            details: self.details(),
        };
        (self.status(), Json(body)).into_response()
    }
}
