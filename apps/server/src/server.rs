//! HTTP server
//!
//! Routes:
//! - `GET /{publisher}/{extension}` returns the resolved item as JSON
//! - `GET /{publisher}/{extension}/{version}.VSIX` streams the package
//! - `GET /health` answers `ok`

use crate::error::ApiError;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use vsixproxy_core::{IdentifierTriple, VsixProxyCore};
use vsixproxy_types::ResolvedItem;

/// Suffix of package download paths
const PACKAGE_SUFFIX: &str = ".VSIX";

// ============================================================================
// Shared state
// ============================================================================

pub struct AppState {
    pub core: VsixProxyCore,
    /// Host reported when a request carries no Host header
    pub fallback_host: String,
}

type SharedState = Arc<AppState>;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/:publisher/:extension", get(handle_metadata))
        .route("/:publisher/:extension/:package", get(handle_download))
        .fallback(handle_not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Bind `addr` and serve until `shutdown` resolves
pub async fn serve<F>(state: AppState, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("vsixproxy listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

// ============================================================================
// HTTP Handlers
// ============================================================================

/// GET /{publisher}/{extension}
async fn handle_metadata(
    State(state): State<SharedState>,
    Path((publisher, extension)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<ResolvedItem>, ApiError> {
    let triple = IdentifierTriple::new(publisher, extension, None)?;
    let (scheme, host) = request_origin(&headers, &state.fallback_host);

    let item = state.core.resolve(&triple, &scheme, &host).await?;
    Ok(Json(item))
}

/// GET /{publisher}/{extension}/{version}.VSIX
async fn handle_download(
    State(state): State<SharedState>,
    Path((publisher, extension, package)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let version = package
        .strip_suffix(PACKAGE_SUFFIX)
        .ok_or_else(|| ApiError::NotFound(format!("/{}/{}/{}", publisher, extension, package)))?;
    let triple = IdentifierTriple::new(publisher, extension, Some(version.to_string()))?;
    let (scheme, host) = request_origin(&headers, &state.fallback_host);

    // Upstream status is checked inside open_download, before any header goes out
    let download = state.core.open_download(&triple, &scheme, &host).await?;
    let response_headers = download.headers().clone();
    let body = Body::from_stream(download.into_stream());

    Ok((response_headers, body).into_response())
}

async fn handle_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

/// Scheme and host the caller used to reach this service
fn request_origin(headers: &HeaderMap, fallback_host: &str) -> (String, String) {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let scheme = header_str("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
    let host = header_str("x-forwarded-host")
        .or_else(|| header_str(header::HOST.as_str()))
        .unwrap_or_else(|| fallback_host.to_string());

    (scheme, host)
}
