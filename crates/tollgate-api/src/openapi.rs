//! # OpenAPI Specification Assembly
//!
//! Serves the generated OpenAPI 3.1 document at `/openapi.json`. The
//! document describes the default token path; a deployment that moves it
//! via `gate.tokenPath` serves the same schema at the new path.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the gate's own surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tollgate Bearer Token Gate",
        version = "0.1.0",
        description = "Credential exchange for short-lived opaque bearer tokens, and bearer validation for every protected route.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(crate::issuance::issue_token),
    components(schemas(
        crate::issuance::TokenRequest,
        crate::issuance::TokenResponse,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "auth", description = "Token issuance"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
