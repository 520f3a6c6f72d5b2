// src/core/metadata.rs

//! The metadata request pipeline: cache lookup, disk read, parse, rewrite,
//! store, respond.

use super::base_url::BaseUrl;
use super::cache::{CacheKey, ResponseCache};
use super::errors::MirrorError;
use super::metrics;
use super::request_path::RequestPath;
use super::rewrite::rewrite_in_place;
use super::store::DocumentStore;
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Serves rewritten package metadata, caching each rendered document.
///
/// The service owns no global state: the store and cache are injected, so
/// each test (or each server) can run with its own isolated instances.
pub struct MetadataService {
    store: Arc<dyn DocumentStore>,
    cache: Arc<ResponseCache>,
    port: u16,
    key_includes_host: bool,
}

impl MetadataService {
    /// Creates a service that renders tarball URLs for the given listening
    /// `port`. When `key_includes_host` is false the cache is keyed by path
    /// alone and the first request's host is baked into the cached render.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<ResponseCache>,
        port: u16,
        key_includes_host: bool,
    ) -> Self {
        Self {
            store,
            cache,
            port,
            key_includes_host,
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the rendered metadata for `path` as seen by a client that sent
    /// `host` as its `Host` header.
    pub async fn render(
        &self,
        path: &RequestPath,
        host: Option<&str>,
    ) -> Result<Bytes, MirrorError> {
        let base_url = BaseUrl::for_request(host, self.port);
        let key = if self.key_includes_host {
            CacheKey::with_base_url(path.as_str(), base_url.origin())
        } else {
            CacheKey::path_only(path.as_str())
        };

        if let Some(cached) = self.cache.get(&key) {
            debug!("Cache hit for {}", path);
            return Ok(cached);
        }

        let rendered = self.render_with(path, &base_url).await?;
        self.cache.put(key, rendered.clone());
        Ok(rendered)
    }

    /// Renders `path` from the store without consulting or filling the cache.
    pub async fn render_uncached(
        &self,
        path: &RequestPath,
        host: Option<&str>,
    ) -> Result<Bytes, MirrorError> {
        let base_url = BaseUrl::for_request(host, self.port);
        self.render_with(path, &base_url).await
    }

    async fn render_with(
        &self,
        path: &RequestPath,
        base_url: &BaseUrl,
    ) -> Result<Bytes, MirrorError> {
        let started = Instant::now();
        let result = self.read_and_rewrite(path, base_url).await;
        metrics::RENDER_LATENCY_SECONDS.observe(started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            metrics::METADATA_ERRORS_TOTAL
                .with_label_values(&[e.kind()])
                .inc();
            match e {
                MirrorError::NotFound(_) => debug!("No metadata for {}", path),
                MirrorError::MalformedDocument { .. } => {
                    error!("Registry snapshot may be corrupted: {}", e)
                }
                _ => error!("Failed to render metadata for {}: {}", path, e),
            }
        }
        result
    }

    async fn read_and_rewrite(
        &self,
        path: &RequestPath,
        base_url: &BaseUrl,
    ) -> Result<Bytes, MirrorError> {
        let raw = self.store.read(path).await?;

        let mut document: Value =
            serde_json::from_slice(&raw).map_err(|e| MirrorError::MalformedDocument {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let rewritten = rewrite_in_place(&mut document, base_url);
        debug!(
            "Rewrote {} tarball URL(s) in {} for {}",
            rewritten, path, base_url
        );

        let body = serde_json::to_vec(&document)
            .map_err(|e| MirrorError::Internal(format!("failed to serialize {path}: {e}")))?;
        Ok(Bytes::from(body))
    }
}
