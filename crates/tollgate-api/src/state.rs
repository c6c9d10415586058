//! # Application State
//!
//! Shared state for the Axum application, passed to route handlers via the
//! `State` extractor.

use metrics_exporter_prometheus::PrometheusHandle;

use crate::gate::GateState;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Token store, credential, and routing policy used by the gate.
    pub gate: GateState,
    /// Scrape handle of the installed Prometheus recorder, if any.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create state without a metrics endpoint.
    pub fn new(gate: GateState) -> Self {
        Self {
            gate,
            prometheus: None,
        }
    }

    /// Serve `/metrics` from the given recorder handle.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("gate", &self.gate)
            .field("prometheus", &self.prometheus.is_some())
            .finish()
    }
}
