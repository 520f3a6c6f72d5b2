// src/server/spawner.rs

//! Spawns the server's long-running background tasks.

use super::context::ServerContext;
use super::metrics_server;
use crate::core::tasks::mdns::MdnsAdvertiser;
use crate::core::tasks::sync::RegistrySyncTask;
use anyhow::Result;
use tracing::info;

/// Spawns all enabled background tasks into the context's JoinSet.
pub fn spawn_all(ctx: &mut ServerContext) -> Result<()> {
    let config = ctx.config.clone();
    let shutdown_tx = &ctx.shutdown_tx;
    let background_tasks = &mut ctx.background_tasks;

    // --- Metrics Server ---
    if config.metrics.enabled {
        let cache = ctx.app.metadata.cache().clone();
        let host = config.host.clone();
        let port = config.metrics.port;
        let shutdown_rx_metrics = shutdown_tx.subscribe();
        background_tasks.spawn(async move {
            metrics_server::run_metrics_server(cache, host, port, shutdown_rx_metrics).await
        });
    } else {
        info!("Prometheus metrics server is disabled in the configuration.");
    }

    // --- Registry Sync ---
    if config.sync.enabled {
        let sync_task = RegistrySyncTask::new(&config.sync, config.output_dir.clone());
        let shutdown_rx_sync = shutdown_tx.subscribe();
        background_tasks.spawn(async move {
            sync_task.run(shutdown_rx_sync).await;
            Ok(())
        });
    }

    // --- mDNS Advertisement ---
    if config.mdns.enabled {
        let advertiser = MdnsAdvertiser::new(&config.mdns, ctx.local_addr.port());
        let shutdown_rx_mdns = shutdown_tx.subscribe();
        background_tasks.spawn(async move {
            advertiser.run(shutdown_rx_mdns).await;
            Ok(())
        });
    }

    info!("All background tasks have been spawned.");
    Ok(())
}
