//! Prometheus metrics helpers.
//!
//! Thin wrappers so call sites stay one line and counter names live in one
//! place.

use ::metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static PROMETHEUS: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder once and return a render handle.
///
/// Routers are built more than once in tests; only the first call installs
/// the global recorder, later calls reuse it.
pub fn prometheus_handle() -> PrometheusHandle {
    PROMETHEUS
        .get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .expect("Failed to install Prometheus recorder")
        })
        .clone()
}

/// Count one protocol message, labeled by query.
pub fn record_message(query: &'static str) {
    counter!("thumbrate_messages_total", "query" => query).increment(1);
}

pub fn record_cache_hit() {
    counter!("thumbrate_cache_hits_total").increment(1);
}

pub fn record_cache_miss() {
    counter!("thumbrate_cache_misses_total").increment(1);
}

/// Count one upstream API request (one per dispatched chunk).
pub fn record_upstream_request() {
    counter!("thumbrate_upstream_requests_total").increment(1);
}

/// Count one failed chunk (transport, non-2xx or malformed body).
pub fn record_chunk_failure() {
    counter!("thumbrate_upstream_chunk_failures_total").increment(1);
}
