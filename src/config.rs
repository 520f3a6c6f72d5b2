// src/config.rs

//! Manages server configuration: loading, applying command-line overrides, and validation.

use crate::core::cache::DEFAULT_CACHE_CAPACITY;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Below this many entries the cache is unlikely to hold a working set.
const LOW_CACHE_CAPACITY: usize = 16;

/// Settings for the rendered-metadata response cache.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CacheConfig {
    /// The maximum number of rendered documents kept in memory.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    /// If true, cache entries are keyed by path and the client's base URL, so
    /// clients reaching the mirror under different hostnames each get tarball
    /// URLs for their own hostname. If false, the first request for a path
    /// decides the hostname for everyone until the entry is evicted.
    #[serde(default)]
    pub key_includes_host: bool,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            key_includes_host: false,
        }
    }
}

impl CacheConfig {
    pub fn capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.capacity).ok_or_else(|| anyhow!("cache.capacity cannot be 0"))
    }
}

/// Settings for the external registry sync process.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SyncConfig {
    /// If true, the sync command is started once the server is listening.
    #[serde(default)]
    pub enabled: bool,
    /// The executable that mirrors the upstream registry into the output directory.
    #[serde(default = "default_sync_command")]
    pub command: String,
    /// The domain the sync process writes into the snapshot's tarball URLs.
    #[serde(default = "default_sync_domain")]
    pub domain: String,
    /// How long to wait for the sync process after SIGINT before killing it.
    #[serde(default = "default_sync_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_sync_command() -> String {
    "registry-static".to_string()
}
fn default_sync_domain() -> String {
    "localhost".to_string()
}
fn default_sync_shutdown_grace() -> u64 {
    5
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: default_sync_command(),
            domain: default_sync_domain(),
            shutdown_grace_secs: default_sync_shutdown_grace(),
        }
    }
}

/// Settings for advertising the mirror on the local network over mDNS.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MdnsConfig {
    /// If true, the mirror announces itself once it is listening.
    #[serde(default = "default_mdns_enabled")]
    pub enabled: bool,
    /// The DNS-SD service type, including the `.local.` domain.
    #[serde(default = "default_mdns_service_type")]
    pub service_type: String,
    /// The instance name shown to browsing clients.
    #[serde(default = "default_mdns_instance_name")]
    pub instance_name: String,
}

fn default_mdns_enabled() -> bool {
    true
}
fn default_mdns_service_type() -> String {
    "_reginabox._tcp.local.".to_string()
}
fn default_mdns_instance_name() -> String {
    "reginabox".to_string()
}

impl Default for MdnsConfig {
    fn default() -> Self {
        Self {
            enabled: default_mdns_enabled(),
            service_type: default_mdns_service_type(),
            instance_name: default_mdns_instance_name(),
        }
    }
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MetricsConfig {
    /// If true, an HTTP server will be started to expose Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,
    /// The port for the Prometheus metrics server.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    9878
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

/// A raw representation of the config file before validation.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    cache: CacheConfig,
    #[serde(default)]
    sync: SyncConfig,
    #[serde(default)]
    mdns: MdnsConfig,
    #[serde(default)]
    metrics: MetricsConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_output_dir() -> PathBuf {
    std::env::current_dir()
        .map(|cwd| cwd.join("registry"))
        .unwrap_or_else(|_| PathBuf::from("registry"))
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Represents the final, validated server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    /// The listening port. `0` asks the OS for an ephemeral port.
    pub port: u16,
    /// Root of the registry snapshot: `index.json`, package metadata and tarballs.
    pub output_dir: PathBuf,
    pub log_level: String,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub mdns: MdnsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            output_dir: default_output_dir(),
            log_level: default_log_level(),
            cache: CacheConfig::default(),
            sync: SyncConfig::default(),
            mdns: MdnsConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Values given on the command line, which take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub output_dir: Option<PathBuf>,
    pub sync: bool,
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{}'", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Invalid configuration in '{}'", path.display()))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let raw_config: RawConfig =
            toml::from_str(contents).context("Failed to parse TOML configuration")?;

        let config = Config {
            host: raw_config.host,
            port: raw_config.port,
            output_dir: raw_config.output_dir,
            log_level: raw_config.log_level,
            cache: raw_config.cache,
            sync: raw_config.sync,
            mdns: raw_config.mdns,
            metrics: raw_config.metrics,
        };

        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given, otherwise starts from the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Applies command-line overrides and re-validates.
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        if overrides.sync {
            self.sync.enabled = true;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(anyhow!("output_dir cannot be empty"));
        }
        self.cache.capacity()?;

        if self.sync.enabled && self.sync.command.trim().is_empty() {
            return Err(anyhow!("sync.command cannot be empty when sync is enabled"));
        }

        if self.mdns.enabled {
            if self.mdns.instance_name.trim().is_empty() {
                return Err(anyhow!("mdns.instance_name cannot be empty"));
            }
            if !self.mdns.service_type.starts_with('_')
                || !self.mdns.service_type.ends_with(".local.")
            {
                return Err(anyhow!(
                    "mdns.service_type must look like '_name._tcp.local.', got '{}'",
                    self.mdns.service_type
                ));
            }
        }

        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(anyhow!("metrics.port cannot be 0"));
            }
            if self.metrics.port == self.port {
                return Err(anyhow!(
                    "metrics.port cannot be the same as the main server port"
                ));
            }
        }
        Ok(())
    }

    /// Settings that are valid but probably not what the operator wants.
    /// Reported once logging is up, since `validate` runs before it.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.cache.capacity < LOW_CACHE_CAPACITY {
            warnings.push(format!(
                "low cache.capacity setting: {}. Most metadata requests will miss the cache.",
                self.cache.capacity
            ));
        }
        warnings
    }
}
