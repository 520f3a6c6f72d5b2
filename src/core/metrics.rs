// src/core/metrics.rs

//! Defines and registers Prometheus metrics for server monitoring.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only once
//! globally for the entire application lifecycle.

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, TextEncoder, register_counter, register_counter_vec,
    register_gauge, register_histogram,
};

lazy_static! {
    // --- Request Counters ---
    /// The total number of HTTP requests, labeled by the responder that handled them.
    pub static ref REQUESTS_TOTAL: CounterVec =
        register_counter_vec!("reginabox_requests_total", "Total number of requests, labeled by route.", &["route"]).unwrap();
    /// Metadata requests that ended in an error, labeled by error kind.
    pub static ref METADATA_ERRORS_TOTAL: CounterVec =
        register_counter_vec!("reginabox_metadata_errors_total", "Total number of failed metadata renders, labeled by kind.", &["kind"]).unwrap();


    // --- Cache ---
    pub static ref CACHE_HITS_TOTAL: Counter =
        register_counter!("reginabox_cache_hits_total", "Total number of metadata cache hits.").unwrap();
    pub static ref CACHE_MISSES_TOTAL: Counter =
        register_counter!("reginabox_cache_misses_total", "Total number of metadata cache misses.").unwrap();
    /// Rendered documents dropped to make room for newer ones.
    pub static ref CACHE_EVICTIONS_TOTAL: Counter =
        register_counter!("reginabox_cache_evictions_total", "Total number of cached documents evicted.").unwrap();
    pub static ref CACHE_ENTRIES: Gauge =
        register_gauge!("reginabox_cache_entries", "Number of rendered documents currently cached.").unwrap();


    // --- Histograms ---
    /// Time spent reading, parsing, rewriting and serializing a document on a cache miss.
    pub static ref RENDER_LATENCY_SECONDS: Histogram =
        register_histogram!("reginabox_render_latency_seconds", "Latency of metadata renders in seconds.").unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
