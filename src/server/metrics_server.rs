// src/server/metrics_server.rs

use crate::core::cache::ResponseCache;
use crate::core::metrics::{self, gather_metrics};
use anyhow::{Context, Result};
use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Handles HTTP requests to the /metrics endpoint.
///
/// It refreshes the cache gauge before gathering all registered metrics
/// and encoding them in the Prometheus text format.
async fn metrics_handler(cache: Arc<ResponseCache>) -> impl IntoResponse {
    metrics::CACHE_ENTRIES.set(cache.len() as f64);

    let body = gather_metrics();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        body,
    )
}

/// Runs a simple HTTP server to expose Prometheus metrics on /metrics.
///
/// The exporter listens on its own port: `/metrics` on the main port is a
/// legitimate package name.
pub async fn run_metrics_server(
    cache: Arc<ResponseCache>,
    host: String,
    port: u16,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let app = Router::new().route("/metrics", get(move || metrics_handler(cache.clone())));

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind metrics server on port {port}"))?;
    info!(
        "Prometheus metrics server listening on http://{}/metrics",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.recv().await.ok();
            info!("Metrics server shutting down.");
        })
        .await
        .context("Metrics server failed")
}
