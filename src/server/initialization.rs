// src/server/initialization.rs

//! Handles server initialization: validating the output directory, binding
//! the listener, and wiring the store, cache and metadata service together.

use super::context::ServerContext;
use super::router::{AppState, INDEX_FILE_NAME};
use crate::config::Config;
use crate::core::cache::ResponseCache;
use crate::core::metadata::MetadataService;
use crate::core::store::{DocumentStore, FsDocumentStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Initializes all server components before starting the main loop.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    prepare_output_dir(&config).await?;

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    let local_addr = listener.local_addr()?;
    info!("reginabox listening on {}", local_addr);

    // Tarball URLs must carry the port we actually bound, which differs from
    // the configured one when an ephemeral port (0) was requested.
    let store: Arc<dyn DocumentStore> = Arc::new(FsDocumentStore::new(&config.output_dir));
    let cache = Arc::new(ResponseCache::new(config.cache.capacity()?));
    let metadata = Arc::new(MetadataService::new(
        store,
        cache,
        local_addr.port(),
        config.cache.key_includes_host,
    ));
    let app = AppState::new(metadata, config.output_dir.clone());

    Ok(ServerContext {
        config: Arc::new(config),
        app,
        listener,
        local_addr,
        shutdown_tx,
        background_tasks: JoinSet::new(),
    })
}

/// Makes sure the output directory is usable. With sync enabled the
/// directory is created so the sync process has somewhere to write.
async fn prepare_output_dir(config: &Config) -> Result<()> {
    let dir = &config.output_dir;
    if config.sync.enabled {
        tokio::fs::create_dir_all(dir).await.with_context(|| {
            format!("Failed to create output directory '{}'", dir.display())
        })?;
        return Ok(());
    }

    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => {
            if tokio::fs::metadata(dir.join(INDEX_FILE_NAME)).await.is_err() {
                warn!(
                    "No {} in '{}'. Has the registry been synced?",
                    INDEX_FILE_NAME,
                    dir.display()
                );
            }
        }
        Ok(_) => warn!("Output path '{}' is not a directory.", dir.display()),
        Err(_) => warn!(
            "Output directory '{}' does not exist. Every request will return 404 until it is populated.",
            dir.display()
        ),
    }
    Ok(())
}

/// Logs key configuration parameters at startup.
fn log_startup_info(config: &Config) {
    info!("Using output directory {}", config.output_dir.display());
    info!(
        "Metadata cache capacity: {} documents (keyed by {}).",
        config.cache.capacity,
        if config.cache.key_includes_host {
            "path and host"
        } else {
            "path"
        }
    );
    for warning in config.warnings() {
        warn!("{}", warning);
    }
}
