// src/core/errors.rs

//! Defines the error type shared by the metadata pipeline.

use std::sync::Arc;
use thiserror::Error;

/// Failures that can terminate a metadata request.
///
/// The response cache and the URL rewriter never produce errors; every variant
/// here originates from path parsing, the document store, or JSON handling, and
/// is translated into an HTTP status at the edge of the request handler.
#[derive(Error, Debug, Clone)]
pub enum MirrorError {
    /// No on-disk document exists for the requested path.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Reading the document failed for a reason other than absence.
    #[error("storage failure reading '{path}': {source}")]
    StorageFailure {
        path: String,
        source: Arc<std::io::Error>,
    },

    /// The on-disk document is not valid JSON. Indicates a corrupted snapshot.
    #[error("malformed document at '{path}': {reason}")]
    MalformedDocument { path: String, reason: String },

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl MirrorError {
    /// Builds a `MirrorError` from an I/O failure while reading `path`,
    /// separating "does not exist" from every other storage error.
    pub fn from_io(path: impl Into<String>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => {
                MirrorError::NotFound(path)
            }
            _ => MirrorError::StorageFailure {
                path,
                source: Arc::new(err),
            },
        }
    }

    /// A short, stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MirrorError::NotFound(_) => "not_found",
            MirrorError::StorageFailure { .. } => "storage_failure",
            MirrorError::MalformedDocument { .. } => "malformed_document",
            MirrorError::Internal(_) => "internal",
        }
    }

    /// The HTTP status code this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            MirrorError::NotFound(_) => 404,
            _ => 500,
        }
    }
}
