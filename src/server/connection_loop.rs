// src/server/connection_loop.rs

//! Contains the main serving loop and graceful shutdown handling.

use super::context::ServerContext;
use super::router::build_router;
use anyhow::{Context, Result, anyhow};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};

/// Serves HTTP until SIGINT/SIGTERM, the HTTP server itself failing, or a
/// background task failing, then shuts everything down.
pub async fn run(mut ctx: ServerContext) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow!("Failed to register SIGINT handler: {}", e))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow!("Failed to register SIGTERM handler: {}", e))?;

    let app = build_router(ctx.app.clone());
    let mut http_shutdown_rx = ctx.shutdown_tx.subscribe();
    let server = axum::serve(
        ctx.listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        http_shutdown_rx.recv().await.ok();
    });
    let mut http_task = tokio::spawn(async move { server.await });
    info!(
        "Serving registry on http://{} (tarball URLs use port {})",
        ctx.local_addr,
        ctx.app.metadata.port()
    );

    let mut outcome = Ok(());
    let mut http_finished = false;
    loop {
        tokio::select! {
            biased;

            _ = sigint.recv() => {
                info!("SIGINT received, initiating graceful shutdown.");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, initiating graceful shutdown.");
                break;
            }

            res = &mut http_task => {
                http_finished = true;
                outcome = match res {
                    Ok(Ok(())) => Err(anyhow!("HTTP server stopped unexpectedly")),
                    Ok(Err(e)) => Err(e).context("HTTP server failed"),
                    Err(e) => Err(anyhow!("HTTP server panicked: {e:?}")),
                };
                break;
            }

            Some(res) = ctx.background_tasks.join_next() => {
                match res {
                    Ok(Ok(())) => info!("A background task finished."),
                    Ok(Err(e)) => {
                        error!("CRITICAL: Background task failed: {}. Shutting down.", e);
                        outcome = Err(e);
                        break;
                    }
                    Err(e) => {
                        error!("CRITICAL: Background task panicked: {e:?}. Shutting down.");
                        outcome = Err(anyhow!("background task panicked: {e:?}"));
                        break;
                    }
                }
            },
        }
    }

    info!("Shutting down. Sending signal to all tasks.");
    if ctx.shutdown_tx.send(()).is_err() {
        warn!("No task was listening for the shutdown signal.");
    }

    if !http_finished {
        match http_task.await {
            Ok(Ok(())) => info!("HTTP server stopped."),
            Ok(Err(e)) => error!("HTTP server finished with error: {}", e),
            Err(e) => error!("HTTP server task panicked: {e:?}"),
        }
    }

    info!("Waiting for background tasks to finish...");
    if tokio::time::timeout(Duration::from_secs(10), async {
        while ctx.background_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for background tasks to finish cleanly.");
    };
    info!("Server shutdown complete.");
    outcome
}
