//! # Middleware Stack
//!
//! Tower middleware wrapped around the gate:
//! - [`tracing_layer`]: request/response tracing with `TraceLayer`.
//! - [`metrics`]: gate counters and the Prometheus scrape endpoint.

pub mod metrics;
pub mod tracing_layer;
