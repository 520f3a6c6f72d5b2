// src/main.rs

//! The main entry point for the reginabox registry mirror.

use anyhow::Result;
use clap::Parser;
use reginabox::config::{Config, Overrides};
use reginabox::server;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::filter::EnvFilter;

/// Serve a local mirror of a package registry.
#[derive(Parser)]
#[command(name = "reginabox")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Package registry mirror for the local network")]
struct Args {
    /// Directory holding the registry snapshot. Defaults to ./registry.
    output_dir: Option<PathBuf>,

    /// Port to listen on. 0 picks a free port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Start the registry sync process alongside the server.
    #[arg(short, long)]
    sync: bool,

    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The server cannot run without a valid configuration, so report and exit.
    let config = match Config::load(args.config.as_deref()).and_then(|c| {
        c.with_overrides(Overrides {
            port: args.port,
            output_dir: args.output_dir,
            sync: args.sync,
        })
    }) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    // RUST_LOG takes precedence over the configured level.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .compact()
        .with_ansi(true)
        .init();

    if let Err(e) = server::run(config).await {
        error!("Server runtime error: {:#}", e);
        return Err(e);
    }
    Ok(())
}
