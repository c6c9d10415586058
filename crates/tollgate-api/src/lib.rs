//! # tollgate-api: Axum Bearer-Token Gate
//!
//! Puts a bearer-token gate in front of an Axum router. A single trusted
//! client exchanges its credential for a short-lived opaque token at the
//! token path, and every request under the protected prefix must present
//! that token.
//!
//! ## API Surface
//!
//! | Route                  | Auth      | Purpose                         |
//! |------------------------|-----------|---------------------------------|
//! | `POST /token`          | credential| Issue a bearer token            |
//! | `/api/*`               | bearer    | Protected application routes    |
//! | `GET /api/ping`        | bearer    | Built-in protected probe        |
//! | `GET /health/*`        | none      | Liveness / readiness probes     |
//! | `GET /metrics`         | none      | Prometheus scrape (if enabled)  |
//! | `GET /openapi.json`    | none      | Generated OpenAPI document      |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthGate → Handler
//! ```
//!
//! ## Embedding
//!
//! Hosts with their own routes wrap them with [`protect`] instead of
//! using [`app`].

pub mod config;
pub mod error;
pub mod gate;
pub mod issuance;
pub mod middleware;
pub mod openapi;
pub mod state;
pub mod sweeper;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;

use crate::gate::{auth_gate, GateState};
use crate::state::AppState;

pub use error::{AppError, AuthFailure};
pub use gate::GatePolicy;

/// Wrap `router` with the auth gate.
///
/// The gate runs for every request reaching the router, including ones
/// that match no route, so the token path needs no route of its own.
pub fn protect(router: Router, gate: GateState) -> Router {
    router.layer(from_fn_with_state(gate, auth_gate))
}

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let mut routes = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/api/ping", get(ping))
        .merge(openapi::router());

    if state.prometheus.is_some() {
        routes = routes.route("/metrics", get(middleware::metrics::prometheus_metrics));
    }

    let gate = state.gate.clone();
    protect(routes.with_state(state), gate)
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
}

/// Liveness probe. Always 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. The store is initialized before the router exists,
/// so a served request means the gate is ready.
async fn readiness() -> &'static str {
    "ready"
}

/// Protected probe; reaching it proves the bearer token was accepted.
async fn ping() -> &'static str {
    "pong"
}
