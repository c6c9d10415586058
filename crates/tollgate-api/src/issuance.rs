//! # Token Issuance
//!
//! Credential exchange at the token path. The body is
//! `{"clientId": "...", "secret": "..."}`; on an exact match of both fields
//! a fresh token is appended to the store and returned.
//!
//! Any failure to produce a matching credential (wrong field, missing field,
//! non-string field, unparseable body) is the same `NoAccess` rejection.

use axum::extract::Request;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tollgate_core::AccessToken;
use utoipa::ToSchema;

use crate::error::{AppError, AuthFailure, ErrorBody};
use crate::gate::GateState;
use crate::middleware::metrics;

/// Largest token request body read before giving up.
const MAX_TOKEN_REQUEST_BYTES: usize = 16 * 1024;

/// Credential exchange request.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub client_id: String,
    pub secret: String,
}

/// Issued token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Opaque bearer token.
    pub access_token: String,
    /// Always `"Bearer"`.
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// POST /token: exchange the client credential for a bearer token.
#[utoipa::path(
    post,
    path = "/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Credential rejected", body = ErrorBody),
        (status = 503, description = "Token store unavailable", body = ErrorBody),
    ),
    tag = "auth"
)]
pub async fn issue_token(gate: &GateState, request: Request) -> Result<Response, AppError> {
    let credentials = match read_request(request).await {
        Some(req) if gate.credential.matches(&req.client_id, &req.secret) => req,
        _ => {
            tracing::warn!(kind = AuthFailure::NoAccess.as_str(), "token request rejected");
            metrics::record_rejection(AuthFailure::NoAccess);
            return Err(AuthFailure::NoAccess.into());
        }
    };

    let token = AccessToken::generate();
    let expires_at = gate.ttl.expires_at(gate.clock.now_millis());
    gate.store.append_token(token.clone(), expires_at).await?;

    tracing::info!(
        client_id = %credentials.client_id,
        expires_at,
        "access token issued"
    );
    metrics::record_issued(gate.store.len());

    let body = TokenResponse {
        access_token: token.into_string(),
        token_type: "Bearer".to_string(),
        expires_in: gate.ttl.as_secs(),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "no-store"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(body),
    )
        .into_response())
}

/// Read and parse the request body, yielding `None` for anything unusable.
async fn read_request(request: Request) -> Option<TokenRequest> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_TOKEN_REQUEST_BYTES)
        .await
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}
