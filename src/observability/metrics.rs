//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_rpc_calls_total` (counter): node calls by method, outcome
//! - `gateway_rpc_call_duration_seconds` (histogram): node call latency by method
//! - `gateway_pipeline_runs_total` (counter): operation runs by pipeline, outcome
//! - `gateway_requests_total` (counter): HTTP requests by method, route, status
//! - `gateway_request_duration_seconds` (histogram): HTTP latency by route
//!
//! # Design Decisions
//! - Recording is a no-op until [`init_metrics`] installs the exporter, so
//!   tests and library users pay nothing
//! - Labels are bounded: RPC method names, pipeline names and route templates

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

fn outcome(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}

/// Install the Prometheus exporter with its own scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one JSON-RPC round trip.
pub fn record_rpc_call(method: &str, ok: bool, start: Instant) {
    let method = method.to_string();
    ::metrics::counter!(
        "gateway_rpc_calls_total",
        "method" => method.clone(),
        "outcome" => outcome(ok)
    )
    .increment(1);
    ::metrics::histogram!("gateway_rpc_call_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

/// Record one pipeline run.
pub fn record_pipeline(pipeline: &'static str, ok: bool) {
    ::metrics::counter!(
        "gateway_pipeline_runs_total",
        "pipeline" => pipeline,
        "outcome" => outcome(ok)
    )
    .increment(1);
}

/// Record one HTTP request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let route = route.to_string();
    ::metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "route" => route.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("gateway_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}
