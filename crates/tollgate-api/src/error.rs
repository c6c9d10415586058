//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//!
//! The three authentication failures render as 401 with a
//! `WWW-Authenticate` challenge. A token store outage renders as 503 and
//! never masquerades as a missing token. Store error details are logged,
//! never returned to the client.

use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tollgate_store::StoreError;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NO_TOKEN", "STORE_UNAVAILABLE").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Why an unauthenticated caller was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthFailure {
    /// Missing or malformed `Authorization` header, or no tokens exist.
    NoToken,
    /// Token unknown to the store or expired.
    InvalidToken,
    /// Credential exchange at the token path failed.
    NoAccess,
}

impl AuthFailure {
    /// The `WWW-Authenticate` challenge sent with this failure.
    pub fn challenge(&self) -> &'static str {
        match self {
            Self::NoToken => {
                r#"Bearer, error="no_token", error_description="No access token supplied""#
            }
            Self::InvalidToken => {
                r#"Bearer, error="invalid_token", error_description="Invalid or expired access token""#
            }
            Self::NoAccess => r#"Bearer realm="/token""#,
        }
    }

    /// Machine-readable code used in the error body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoToken => "NO_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::NoAccess => "NO_ACCESS",
        }
    }

    /// Lowercase label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoToken => "no_token",
            Self::InvalidToken => "invalid_token",
            Self::NoAccess => "no_access",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::NoToken => "No access token supplied",
            Self::InvalidToken => "Invalid or expired access token",
            Self::NoAccess => "Invalid client credentials",
        }
    }
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Authentication failure (401).
    #[error("unauthorized: {}", .0.as_str())]
    Unauthorized(AuthFailure),

    /// Token store cannot be read or written (503).
    #[error("token store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized(kind) => (StatusCode::UNAUTHORIZED, kind.code()),
            Self::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
        }
    }
}

impl From<AuthFailure> for AppError {
    fn from(kind: AuthFailure) -> Self {
        Self::Unauthorized(kind)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Unauthorized(kind) => kind.description().to_string(),
            Self::StoreUnavailable(err) => {
                tracing::error!(error = %err, "token store unavailable");
                "The token store is temporarily unavailable".to_string()
            }
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Self::Unauthorized(kind) = &self {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static(kind.challenge()));
        }
        response
    }
}
