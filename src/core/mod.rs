// src/core/mod.rs

//! The metadata pipeline: path normalization, document store, URL rewriting
//! and the response cache, plus the service that ties them together.

pub mod base_url;
pub mod cache;
pub mod errors;
pub mod metadata;
pub mod metrics;
pub mod request_path;
pub mod rewrite;
pub mod store;
pub mod tasks;

pub use cache::{CacheKey, ResponseCache};
pub use errors::MirrorError;
pub use metadata::MetadataService;
pub use request_path::RequestPath;
pub use store::{DocumentStore, FsDocumentStore};
