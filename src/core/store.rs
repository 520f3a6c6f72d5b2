// src/core/store.rs

//! Read access to the on-disk registry snapshot.

use super::errors::MirrorError;
use super::request_path::RequestPath;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

/// The file name holding a package's metadata inside its directory.
pub const METADATA_FILE_NAME: &str = "index.json";

/// A source of raw metadata documents, addressed by request path.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the raw bytes of the document for `path`, `NotFound` if no such
    /// document exists, or `StorageFailure` for any other read error.
    async fn read(&self, path: &RequestPath) -> Result<Bytes, MirrorError>;
}

/// Reads `<output_dir>/<path>/index.json` from the local filesystem.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    output_dir: PathBuf,
}

impl FsDocumentStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// The on-disk location of the document for `path`.
    pub fn document_path(&self, path: &RequestPath) -> PathBuf {
        self.output_dir
            .join(path.relative())
            .join(METADATA_FILE_NAME)
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn read(&self, path: &RequestPath) -> Result<Bytes, MirrorError> {
        let file = self.document_path(path);
        match tokio::fs::read(&file).await {
            Ok(contents) => Ok(Bytes::from(contents)),
            Err(e) => Err(MirrorError::from_io(file.display().to_string(), e)),
        }
    }
}
