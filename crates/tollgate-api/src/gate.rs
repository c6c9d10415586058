//! # Authentication Gate
//!
//! Middleware that sits in front of every route. For each request it picks
//! one branch, in this order:
//!
//! 1. Path equals the token path: `POST` runs the credential exchange
//!    ([`crate::issuance`]); any other method falls through untouched.
//! 2. Path does not require authentication: forwarded.
//! 3. Otherwise the `Authorization: Bearer <token>` header is checked
//!    against the [`TokenStore`].
//!
//! A successful check forwards the request with nothing attached; there is
//! no caller identity beyond "authenticated".

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tollgate_core::{AccessToken, ClientCredential, Clock, SystemClock, TokenTtl};
use tollgate_store::{TokenStatus, TokenStore};

use crate::error::{AppError, AuthFailure};
use crate::issuance;
use crate::middleware::metrics;

type AuthPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Which branch of the gate a request takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateBranch {
    /// `POST` to the token path: credential exchange.
    Issue,
    /// Not subject to authentication.
    Forward,
    /// Must carry a valid bearer token.
    Authenticate,
}

/// Routing policy: the token path plus a predicate deciding which other
/// paths require a bearer token.
#[derive(Clone)]
pub struct GatePolicy {
    token_path: String,
    requires_auth: AuthPredicate,
}

impl GatePolicy {
    /// Paths starting with `prefix` require authentication.
    ///
    /// This is a plain string prefix: `/api` also covers `/apiary`.
    pub fn with_prefix(token_path: impl Into<String>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            token_path: token_path.into(),
            requires_auth: Arc::new(move |path: &str| path.starts_with(prefix.as_str())),
        }
    }

    /// Paths for which `requires_auth` returns true require authentication.
    pub fn with_predicate(
        token_path: impl Into<String>,
        requires_auth: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            token_path: token_path.into(),
            requires_auth: Arc::new(requires_auth),
        }
    }

    /// The credential-exchange path.
    pub fn token_path(&self) -> &str {
        &self.token_path
    }

    /// Decide the branch for a request.
    pub fn route(&self, method: &Method, path: &str) -> GateBranch {
        if path == self.token_path {
            if method == Method::POST {
                GateBranch::Issue
            } else {
                GateBranch::Forward
            }
        } else if (self.requires_auth)(path) {
            GateBranch::Authenticate
        } else {
            GateBranch::Forward
        }
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::with_prefix("/token", "/api")
    }
}

impl std::fmt::Debug for GatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatePolicy")
            .field("token_path", &self.token_path)
            .finish_non_exhaustive()
    }
}

/// Everything the gate needs, shared across requests.
#[derive(Debug, Clone)]
pub struct GateState {
    pub store: TokenStore,
    pub credential: ClientCredential,
    pub ttl: TokenTtl,
    pub policy: GatePolicy,
    pub clock: Arc<dyn Clock>,
}

impl GateState {
    /// Create gate state reading time from the system clock.
    pub fn new(
        store: TokenStore,
        credential: ClientCredential,
        ttl: TokenTtl,
        policy: GatePolicy,
    ) -> Self {
        Self {
            store,
            credential,
            ttl,
            policy,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Extract the bearer token from the `Authorization` header.
///
/// The header must split on whitespace into exactly two parts, the first of
/// which is `Bearer` in any letter case.
pub fn bearer_token(headers: &HeaderMap) -> Option<AccessToken> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    AccessToken::parse(token).ok()
}

/// Check the request's bearer token against the store.
pub fn authenticate(gate: &GateState, headers: &HeaderMap) -> Result<(), AuthFailure> {
    let token = bearer_token(headers).ok_or(AuthFailure::NoToken)?;
    match gate.store.check(&token, gate.clock.now_millis()) {
        TokenStatus::Valid => Ok(()),
        TokenStatus::Empty => Err(AuthFailure::NoToken),
        TokenStatus::Invalid => Err(AuthFailure::InvalidToken),
    }
}

/// The gate middleware. Mount with
/// `axum::middleware::from_fn_with_state(gate_state, auth_gate)`.
pub async fn auth_gate(State(gate): State<GateState>, request: Request, next: Next) -> Response {
    match gate.policy.route(request.method(), request.uri().path()) {
        GateBranch::Issue => match issuance::issue_token(&gate, request).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        },
        GateBranch::Forward => next.run(request).await,
        GateBranch::Authenticate => match authenticate(&gate, request.headers()) {
            Ok(()) => {
                metrics::record_forwarded();
                next.run(request).await
            }
            Err(kind) => {
                tracing::warn!(
                    kind = kind.as_str(),
                    path = %request.uri().path(),
                    "authentication failed"
                );
                metrics::record_rejection(kind);
                AppError::Unauthorized(kind).into_response()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, StatusCode};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tollgate_core::ManualClock;
    use tollgate_store::{MemoryBackend, StoreOptions};
    use tower::ServiceExt;

    fn headers(auth: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        map
    }

    async fn gate_state(clock: ManualClock) -> GateState {
        let store = TokenStore::initialize(Arc::new(MemoryBackend::new()), StoreOptions::default())
            .await
            .unwrap();
        GateState::new(
            store,
            ClientCredential::new("testClient", "superSecret").unwrap(),
            TokenTtl::from_secs(60).unwrap(),
            GatePolicy::default(),
        )
        .with_clock(Arc::new(clock))
    }

    /// Build a minimal router with the gate and a simple handler.
    fn test_app(gate: GateState) -> Router {
        Router::new()
            .route("/api/test", get(|| async { "ok" }))
            .route("/open", get(|| async { "open" }))
            .layer(from_fn_with_state(gate, auth_gate))
    }

    // ── routing ──────────────────────────────────────────────────

    #[test]
    fn post_to_token_path_issues() {
        let policy = GatePolicy::default();
        assert_eq!(policy.route(&Method::POST, "/token"), GateBranch::Issue);
    }

    #[test]
    fn other_methods_on_token_path_forward() {
        let policy = GatePolicy::default();
        for method in [Method::GET, Method::PUT, Method::DELETE, Method::OPTIONS] {
            assert_eq!(policy.route(&method, "/token"), GateBranch::Forward);
        }
    }

    #[test]
    fn token_path_match_is_exact() {
        let policy = GatePolicy::default();
        assert_eq!(policy.route(&Method::POST, "/token/extra"), GateBranch::Forward);
        assert_eq!(policy.route(&Method::POST, "/tokens"), GateBranch::Forward);
    }

    #[test]
    fn prefix_decides_authentication() {
        let policy = GatePolicy::default();
        assert_eq!(policy.route(&Method::GET, "/api"), GateBranch::Authenticate);
        assert_eq!(policy.route(&Method::GET, "/api/x"), GateBranch::Authenticate);
        assert_eq!(policy.route(&Method::GET, "/apiary"), GateBranch::Authenticate);
        assert_eq!(policy.route(&Method::GET, "/health"), GateBranch::Forward);
        assert_eq!(policy.route(&Method::GET, "/v1/api"), GateBranch::Forward);
    }

    #[test]
    fn custom_predicate() {
        let policy = GatePolicy::with_predicate("/auth", |path| path != "/public");
        assert_eq!(policy.route(&Method::POST, "/auth"), GateBranch::Issue);
        assert_eq!(policy.route(&Method::GET, "/public"), GateBranch::Forward);
        assert_eq!(policy.route(&Method::GET, "/anything"), GateBranch::Authenticate);
    }

    // ── header parsing ───────────────────────────────────────────

    #[test]
    fn bearer_token_extracted() {
        let token = bearer_token(&headers("Bearer abc-123")).unwrap();
        assert_eq!(token.as_str(), "abc-123");
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert!(bearer_token(&headers("bearer abc")).is_some());
        assert!(bearer_token(&headers("BEARER abc")).is_some());
    }

    #[test]
    fn extra_whitespace_between_parts_is_tolerated() {
        assert_eq!(
            bearer_token(&headers("Bearer \t abc")).unwrap().as_str(),
            "abc"
        );
    }

    #[test]
    fn malformed_headers_yield_nothing() {
        for value in ["Basic abc", "Bearer", "Bearer a b", "abc", "", "Bearerabc"] {
            assert!(
                bearer_token(&headers(value)).is_none(),
                "{value:?} should not yield a token"
            );
        }
    }

    #[test]
    fn missing_header_yields_nothing() {
        assert!(bearer_token(&HeaderMap::new()).is_none());
    }

    // ── authenticate ─────────────────────────────────────────────

    #[tokio::test]
    async fn empty_store_is_no_token() {
        let gate = gate_state(ManualClock::new(0)).await;
        assert_eq!(
            authenticate(&gate, &headers("Bearer abc")),
            Err(AuthFailure::NoToken)
        );
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let gate = gate_state(ManualClock::new(0)).await;
        gate.store
            .append_token(AccessToken::parse("known").unwrap(), 100)
            .await
            .unwrap();
        assert_eq!(
            authenticate(&gate, &headers("Bearer unknown")),
            Err(AuthFailure::InvalidToken)
        );
    }

    #[tokio::test]
    async fn expiry_boundary() {
        let clock = ManualClock::new(1_000);
        let gate = gate_state(clock.clone()).await;
        gate.store
            .append_token(AccessToken::parse("edge").unwrap(), 1_000)
            .await
            .unwrap();

        assert_eq!(authenticate(&gate, &headers("Bearer edge")), Ok(()));
        clock.advance(1);
        assert_eq!(
            authenticate(&gate, &headers("Bearer edge")),
            Err(AuthFailure::InvalidToken)
        );
    }

    // ── middleware ───────────────────────────────────────────────

    #[tokio::test]
    async fn valid_bearer_token_accepted() {
        let gate = gate_state(ManualClock::new(0)).await;
        gate.store
            .append_token(AccessToken::parse("good").unwrap(), 10)
            .await
            .unwrap();

        let request = Request::builder()
            .uri("/api/test")
            .header("Authorization", "Bearer good")
            .body(Body::empty())
            .unwrap();

        let response = test_app(gate).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn missing_authorization_header_rejected() {
        let gate = gate_state(ManualClock::new(0)).await;
        let request = Request::builder()
            .uri("/api/test")
            .body(Body::empty())
            .unwrap();

        let response = test_app(gate).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn unprotected_route_needs_no_header() {
        let gate = gate_state(ManualClock::new(0)).await;
        let request = Request::builder().uri("/open").body(Body::empty()).unwrap();

        let response = test_app(gate).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
