// src/server/router.rs

//! The HTTP surface of the mirror.
//!
//! Requests are dispatched in order: any path that normalizes to `/` goes to
//! the index responder; any other path is first tried as a static file under the output directory
//! (tarballs), and finally handed to the metadata service, which always
//! produces a response.

use crate::core::errors::MirrorError;
use crate::core::metadata::MetadataService;
use crate::core::metrics;
use crate::core::request_path::RequestPath;
use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{error, info};

/// Value of the `Server` header attached to every response.
pub const SERVER_HEADER: &str = "reginabox";
/// The top-level registry index, served as-is from the output directory.
pub const INDEX_FILE_NAME: &str = "index.json";

const JSON_CONTENT_TYPE: &str = "application/json";
const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub metadata: Arc<MetadataService>,
    pub output_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(metadata: Arc<MetadataService>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            metadata,
            output_dir: Arc::new(output_dir.into()),
        }
    }
}

/// Builds the mirror's router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .fallback(registry)
        .layer(middleware::from_fn(log_and_tag))
        .with_state(state)
}

impl IntoResponse for MirrorError {
    fn into_response(self) -> Response {
        StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response()
    }
}

/// Logs every request and stamps the `Server` header on its response.
async fn log_and_tag(request: Request, next: Next) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string());
    info!("{} {} {}", ip, request.method(), request.uri().path());

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .append(header::SERVER, HeaderValue::from_static(SERVER_HEADER));
    response
}

/// Streams the top-level index straight from disk. Never cached.
async fn index(State(state): State<AppState>) -> Result<Response, MirrorError> {
    metrics::REQUESTS_TOTAL.with_label_values(&["index"]).inc();
    let path = state.output_dir.join(INDEX_FILE_NAME);
    match open_file(&path).await {
        Ok(response) => Ok(response),
        Err(e) => {
            if !matches!(e, MirrorError::NotFound(_)) {
                error!("Failed to serve registry index: {}", e);
            }
            Err(e)
        }
    }
}

/// Serves tarballs and other static files, falling through to package
/// metadata when no file matches.
async fn registry(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, MirrorError> {
    if method != Method::GET && method != Method::HEAD {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }

    let path = RequestPath::parse(uri.path())?;
    if path.is_root() {
        // `//`, `/./` and friends name the index too.
        return index(State(state)).await;
    }

    if let Some(response) = serve_static(&state.output_dir, &path).await {
        metrics::REQUESTS_TOTAL.with_label_values(&["static"]).inc();
        return Ok(response);
    }

    metrics::REQUESTS_TOTAL
        .with_label_values(&["metadata"])
        .inc();
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.host());
    let body = state.metadata.render(&path, host).await?;
    Ok(json_response(body))
}

/// Returns the file at `path` under the output directory if it is a regular
/// file. Any lookup failure means "no static match".
async fn serve_static(output_dir: &Path, path: &RequestPath) -> Option<Response> {
    let file_path = output_dir.join(path.relative());
    let metadata = tokio::fs::metadata(&file_path).await.ok()?;
    if !metadata.is_file() {
        return None;
    }
    open_file(&file_path).await.ok()
}

async fn open_file(path: &Path) -> Result<Response, MirrorError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| MirrorError::from_io(path.display().to_string(), e))?;
    let len = file.metadata().await.ok().map(|m| m.len());

    let mut response = Body::from_stream(ReaderStream::new(file)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(path)),
    );
    if let Some(len) = len {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
    Ok(response)
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => JSON_CONTENT_TYPE,
        _ => BINARY_CONTENT_TYPE,
    }
}

fn json_response(body: Bytes) -> Response {
    (
        [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
        body,
    )
        .into_response()
}
