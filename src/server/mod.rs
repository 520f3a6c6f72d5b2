// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;

mod connection_loop;
mod context;
mod initialization;
mod metrics_server;
pub mod router;
mod spawner;

pub use router::{AppState, build_router};

/// The main server startup function, orchestrating all setup phases.
pub async fn run(config: Config) -> Result<()> {
    // 1. Bind the listener and build the metadata pipeline.
    let mut server_context = initialization::setup(config).await?;

    // 2. Spawn the metrics exporter and the registry sync, if enabled.
    spawner::spawn_all(&mut server_context)?;

    // 3. Serve HTTP until a signal or a failed background task stops us.
    connection_loop::run(server_context).await
}
