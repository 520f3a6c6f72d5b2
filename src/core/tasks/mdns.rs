// src/core/tasks/mdns.rs

//! Advertises the mirror on the local network over mDNS/DNS-SD so clients can
//! discover it without knowing its address.

use crate::config::MdnsConfig;
use anyhow::{Context, Result};
use mdns_sd::{ServiceDaemon, ServiceInfo};
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{info, warn};

pub struct MdnsAdvertiser {
    service_type: String,
    instance_name: String,
    port: u16,
}

impl MdnsAdvertiser {
    /// `port` is the port the server actually bound.
    pub fn new(config: &MdnsConfig, port: u16) -> Self {
        Self {
            service_type: config.service_type.clone(),
            instance_name: config.instance_name.clone(),
            port,
        }
    }

    pub fn host_name(&self) -> String {
        format!("{}.local.", self.instance_name)
    }

    /// The record registered with the responder. Addresses are left empty
    /// and filled in from the host's interfaces by the daemon.
    pub fn service_info(&self) -> Result<ServiceInfo> {
        let properties = HashMap::from([(
            "version".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        )]);
        let info = ServiceInfo::new(
            &self.service_type,
            &self.instance_name,
            &self.host_name(),
            "",
            self.port,
            properties,
        )
        .with_context(|| format!("Invalid mDNS service '{}'", self.service_type))?;
        Ok(info.enable_addr_auto())
    }

    /// Announces the service until shutdown is signalled, then withdraws it.
    /// Failing to advertise is logged; the mirror keeps serving.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let service = match self.service_info() {
            Ok(service) => service,
            Err(e) => {
                warn!("mDNS advertisement disabled: {:#}", e);
                return;
            }
        };
        let daemon = match ServiceDaemon::new() {
            Ok(daemon) => daemon,
            Err(e) => {
                warn!("mDNS advertisement disabled, responder failed to start: {}", e);
                return;
            }
        };

        let fullname = service.get_fullname().to_string();
        if let Err(e) = daemon.register(service) {
            warn!("Failed to register mDNS service {}: {}", fullname, e);
            shutdown_daemon(&daemon);
            return;
        }
        info!("Advertising {} on port {} via mDNS.", fullname, self.port);

        let _ = shutdown_rx.recv().await;
        info!("Withdrawing mDNS advertisement.");
        if let Err(e) = daemon.unregister(&fullname) {
            warn!("Failed to unregister mDNS service {}: {}", fullname, e);
        }
        shutdown_daemon(&daemon);
    }
}

fn shutdown_daemon(daemon: &ServiceDaemon) {
    if let Err(e) = daemon.shutdown() {
        warn!("Failed to stop mDNS responder: {}", e);
    }
}
