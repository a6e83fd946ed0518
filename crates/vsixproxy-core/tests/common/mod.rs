//! Minimal fake marketplace for integration tests.
//!
//! Serves item pages at `/items?itemName={publisher}.{extension}` and package
//! bodies at `/gallery/{publisher}/{extension}/{version}`. Anything not
//! registered answers 404. Page hits are counted so tests can check that
//! nothing is cached.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use vsixproxy_core::{LinkBuilder, LinkTemplate, VsixProxyCore};

#[derive(Default)]
pub struct FakeMarketplace {
    pages: HashMap<String, String>,
    packages: HashMap<String, Vec<u8>>,
    page_hits: AtomicUsize,
}

impl FakeMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item page embedding `metadata_json` as its data island
    pub fn with_metadata(mut self, publisher: &str, extension: &str, metadata_json: &str) -> Self {
        self.pages.insert(
            format!("{}.{}", publisher, extension),
            item_page(&format!(
                r#"<script class="vss-extension" type="application/json">{}</script>"#,
                metadata_json
            )),
        );
        self
    }

    /// Register an item page with arbitrary body content
    pub fn with_page(mut self, publisher: &str, extension: &str, body: &str) -> Self {
        self.pages
            .insert(format!("{}.{}", publisher, extension), item_page(body));
        self
    }

    pub fn with_package(mut self, publisher: &str, extension: &str, version: &str, body: Vec<u8>) -> Self {
        self.packages
            .insert(format!("{}.{}@{}", publisher, extension, version), body);
        self
    }
}

/// A running fake marketplace
pub struct Running {
    pub base_url: String,
    market: Arc<FakeMarketplace>,
}

impl Running {
    pub fn page_hits(&self) -> usize {
        self.market.page_hits.load(Ordering::SeqCst)
    }

    pub fn links(&self) -> LinkBuilder {
        links_for(&self.base_url)
    }

    pub fn core(&self) -> VsixProxyCore {
        VsixProxyCore::new(self.links()).unwrap()
    }
}

pub fn links_for(base_url: &str) -> LinkBuilder {
    links_split(base_url, base_url)
}

/// Item pages from one server, packages from another
pub fn links_split(page_base_url: &str, package_base_url: &str) -> LinkBuilder {
    let display = LinkTemplate::parse(&format!(
        "{}/items?itemName={{publisher}}.{{extension}}",
        page_base_url
    ))
    .unwrap();
    let download = LinkTemplate::parse(&format!(
        "{}/gallery/{{publisher}}/{{extension}}/{{version}}",
        package_base_url
    ))
    .unwrap();
    LinkBuilder::new(display, download).unwrap()
}

/// Raw HTTP/1.1 server that announces `declared_len` bytes, sends `body`
/// and then closes the connection.
pub async fn start_truncating(declared_len: usize, body: Vec<u8>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = Arc::new(body);
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let body = Arc::clone(&body);
            tokio::spawn(async move {
                let mut buf = [0u8; 8192];
                if stream.read(&mut buf).await.is_err() {
                    return;
                }
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\n\r\n",
                    declared_len
                );
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(&body).await;
                let _ = stream.flush().await;
                let _ = stream.shutdown().await;
            });
        }
    });
    format!("http://{}", addr)
}

/// Sink that accepts `limit` bytes and then fails every write
pub struct FailingSink {
    pub received: Vec<u8>,
    limit: usize,
}

impl FailingSink {
    pub fn new(limit: usize) -> Self {
        Self {
            received: Vec::new(),
            limit,
        }
    }
}

impl AsyncWrite for FailingSink {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let room = self.limit - self.received.len();
        if room == 0 {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "client went away",
            )));
        }
        let n = room.min(buf.len());
        self.received.extend_from_slice(&buf[..n]);
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

pub async fn start(market: FakeMarketplace) -> Running {
    let market = Arc::new(market);
    let app = Router::new()
        .route("/items", get(handle_item))
        .route("/gallery/:publisher/:extension/:version", get(handle_package))
        .with_state(market.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Running {
        base_url: format!("http://{}", addr),
        market,
    }
}

/// Base URL of a port nothing listens on
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Deterministic binary fixture
pub fn fixture_payload(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xff) as u8
        })
        .collect()
}

fn item_page(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head><title>Visual Studio Marketplace</title></head>
  <body>
    <div class="ux-item-header"><h1>Extension</h1></div>
    {}
  </body>
</html>"#,
        body
    )
}

async fn handle_item(
    State(market): State<Arc<FakeMarketplace>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    market.page_hits.fetch_add(1, Ordering::SeqCst);
    match query.get("itemName").and_then(|name| market.pages.get(name)) {
        Some(page) => Html(page.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn handle_package(
    State(market): State<Arc<FakeMarketplace>>,
    Path((publisher, extension, version)): Path<(String, String, String)>,
) -> Response {
    let key = format!("{}.{}@{}", publisher, extension, version);
    match market.packages.get(&key) {
        Some(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            body.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
