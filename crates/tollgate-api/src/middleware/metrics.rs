//! # Gate Metrics
//!
//! Counters are recorded through the `metrics` facade. Without an installed
//! recorder (tests, embedding hosts that do not care) every call is a no-op.
//! The binary installs the Prometheus recorder and serves `/metrics`.
//!
//! | Metric | Kind | Labels |
//! |---|---|---|
//! | `tollgate_http_requests_total` | counter | `status` (`2xx`, `4xx`, …) |
//! | `tollgate_tokens_issued_total` | counter | |
//! | `tollgate_auth_rejections_total` | counter | `kind` |
//! | `tollgate_requests_forwarded_total` | counter | |
//! | `tollgate_tokens_stored` | gauge | |

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AuthFailure;
use crate::state::AppState;

/// Record a successful issuance and the resulting collection size.
pub fn record_issued(stored: usize) {
    metrics::counter!("tollgate_tokens_issued_total").increment(1);
    metrics::gauge!("tollgate_tokens_stored").set(stored as f64);
}

/// Record a rejected request.
pub fn record_rejection(kind: AuthFailure) {
    metrics::counter!("tollgate_auth_rejections_total", "kind" => kind.as_str()).increment(1);
}

/// Record an authenticated request passed on to the next stage.
pub fn record_forwarded() {
    metrics::counter!("tollgate_requests_forwarded_total").increment(1);
}

/// Record the collection size after a sweep.
pub fn record_stored(stored: usize) {
    metrics::gauge!("tollgate_tokens_stored").set(stored as f64);
}

/// Middleware that counts responses by status class.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    metrics::counter!("tollgate_http_requests_total", "status" => status_class(response.status()))
        .increment(1);
    response
}

fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

/// GET /metrics: Prometheus text exposition.
pub async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
