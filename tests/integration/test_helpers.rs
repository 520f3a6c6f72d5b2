// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use reginabox::core::cache::ResponseCache;
use reginabox::core::metadata::MetadataService;
use reginabox::core::request_path::RequestPath;
use reginabox::core::store::{DocumentStore, FsDocumentStore};
use reginabox::core::MirrorError;
use reginabox::server::{AppState, build_router};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const UPSTREAM: &str = "https://registry.example.com";

/// Builds a package document with one `dist.tarball` per version, pointing at
/// the upstream registry.
pub fn package_doc(name: &str, versions: &[&str]) -> Value {
    let mut entries = serde_json::Map::new();
    for version in versions {
        entries.insert(
            version.to_string(),
            json!({
                "name": name,
                "version": version,
                "dist": {
                    "shasum": format!("{name}-{version}-sha"),
                    "tarball": format!("{UPSTREAM}/{name}/-/{}-{version}.tgz", short_name(name)),
                }
            }),
        );
    }
    json!({
        "_id": name,
        "name": name,
        "dist-tags": { "latest": versions.last().copied().unwrap_or("0.0.0") },
        "versions": entries,
    })
}

fn short_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// A registry snapshot in a temporary directory.
pub struct TestRegistry {
    pub dir: TempDir,
}

impl TestRegistry {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `<package>/index.json`.
    pub fn add_document(&self, package: &str, document: &Value) {
        self.add_raw(package, serde_json::to_vec(document).unwrap());
    }

    /// Writes arbitrary bytes as `<package>/index.json`.
    pub fn add_raw(&self, package: &str, contents: impl AsRef<[u8]>) {
        let dir = self.path().join(package);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.json"), contents).unwrap();
    }

    /// Writes a file at `relative` under the registry root.
    pub fn add_file(&self, relative: &str, contents: impl AsRef<[u8]>) {
        let file = self.path().join(relative);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, contents).unwrap();
    }
}

/// Wraps a filesystem store and counts how often it is read.
pub struct CountingStore {
    inner: FsDocumentStore,
    reads: AtomicUsize,
}

impl CountingStore {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            inner: FsDocumentStore::new(output_dir),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn read(&self, path: &RequestPath) -> Result<Bytes, MirrorError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(path).await
    }
}

/// A metadata service over a temporary registry, with read counting.
pub struct TestContext {
    pub registry: TestRegistry,
    pub store: Arc<CountingStore>,
    pub cache: Arc<ResponseCache>,
    pub service: Arc<MetadataService>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_options(8080, 100, false)
    }

    pub fn with_options(port: u16, capacity: usize, key_includes_host: bool) -> Self {
        let registry = TestRegistry::new();
        let store = Arc::new(CountingStore::new(registry.path()));
        let cache = Arc::new(ResponseCache::new(NonZeroUsize::new(capacity).unwrap()));
        let service = Arc::new(MetadataService::new(
            store.clone(),
            cache.clone(),
            port,
            key_includes_host,
        ));
        Self {
            registry,
            store,
            cache,
            service,
        }
    }

    pub async fn render(&self, path: &str, host: Option<&str>) -> Result<Bytes, MirrorError> {
        let path = RequestPath::parse(path)?;
        self.service.render(&path, host).await
    }

    /// Binds the router on an ephemeral port and serves it in the background.
    pub async fn spawn_server(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_router(AppState::new(
            self.service.clone(),
            self.registry.path().to_path_buf(),
        ));
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });
        addr
    }
}

/// Parses a rendered response body.
pub fn parse(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("rendered body should be JSON")
}

/// Extracts `versions.<version>.dist.tarball` from a document.
pub fn tarball_of(document: &Value, version: &str) -> String {
    document["versions"][version]["dist"]["tarball"]
        .as_str()
        .expect("tarball should be a string")
        .to_string()
}
