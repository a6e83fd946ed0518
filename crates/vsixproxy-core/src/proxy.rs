//! Download Proxy
//!
//! Streams the upstream package to the caller without buffering it. The
//! upstream response status is checked before any header is handed out, so
//! a failed fetch is never announced as a successful attachment.

use crate::error::VsixError;
use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use reqwest::header::{
    HeaderMap, HeaderValue, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE,
};
use reqwest::Client;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{error, info, warn};
use vsixproxy_types::ResolvedItem;

/// Content type announced for packages
pub const PACKAGE_CONTENT_TYPE: &str = "application/zip";

/// Fetches packages from their upstream download link
#[derive(Debug, Clone)]
pub struct DownloadProxy {
    client: Client,
}

impl DownloadProxy {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Start the upstream fetch and prepare the response headers.
    ///
    /// Fails with a fetch error before anything is committed to the caller.
    pub async fn open(&self, item: &ResolvedItem) -> Result<PreparedDownload, VsixError> {
        info!("Downloading {}: {}", item.package_filename(), item.download_link);

        let response = self.client.get(&item.download_link).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(VsixError::UpstreamStatus {
                status: status.as_u16(),
                url: item.download_link.clone(),
            });
        }

        let filename = item.package_filename();
        let mut headers = HeaderMap::new();
        let disposition = HeaderValue::from_str(&format!("attachment; filename={}", filename))
            .map_err(|_| VsixError::InvalidIdentifier(filename.clone()))?;
        headers.insert(CONTENT_DISPOSITION, disposition);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(PACKAGE_CONTENT_TYPE));

        let content_length = response.content_length();
        if let Some(length) = content_length {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        }

        Ok(PreparedDownload {
            filename,
            url: item.download_link.clone(),
            headers,
            content_length,
            response,
        })
    }

    /// Open the download and copy it into `sink`, returning the byte count
    pub async fn stream_download<W>(&self, item: &ResolvedItem, sink: &mut W) -> Result<u64, VsixError>
    where
        W: AsyncWrite + Unpin,
    {
        self.open(item).await?.copy_to(sink).await
    }
}

/// An upstream package response that has passed the status check
#[derive(Debug)]
pub struct PreparedDownload {
    filename: String,
    url: String,
    headers: HeaderMap,
    content_length: Option<u64>,
    response: reqwest::Response,
}

impl PreparedDownload {
    /// Headers to send before the first body byte
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Size announced by upstream, if any
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// The package body as a stream of chunks.
    ///
    /// The stream ends after the first upstream error; the failure and the
    /// final byte count are logged here since the status line has already
    /// gone out by the time they happen.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, VsixError>> + Send + 'static {
        let state = StreamState {
            inner: Some(self.response.bytes_stream().boxed()),
            filename: self.filename,
            url: self.url,
            expected: self.content_length,
            transferred: 0,
        };

        stream::unfold(state, |mut state| async move {
            let inner = state.inner.as_mut()?;
            match inner.next().await {
                Some(Ok(chunk)) => {
                    state.transferred += chunk.len() as u64;
                    Some((Ok(chunk), state))
                }
                Some(Err(e)) => {
                    error!(
                        "Error while downloading {} after {} bytes: {}",
                        state.url, state.transferred, e
                    );
                    state.inner = None;
                    Some((Err(VsixError::Network(e)), state))
                }
                None => {
                    state.finish();
                    None
                }
            }
        })
    }

    /// Copy the body into `sink`, returning the number of bytes written
    pub async fn copy_to<W>(self, sink: &mut W) -> Result<u64, VsixError>
    where
        W: AsyncWrite + Unpin,
    {
        let url = self.url.clone();
        let mut body = Box::pin(self.into_stream());
        let mut written = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            if let Err(e) = sink.write_all(&chunk).await {
                warn!("Sink closed while copying {} after {} bytes: {}", url, written, e);
                return Err(e.into());
            }
            written += chunk.len() as u64;
        }
        sink.flush().await?;

        Ok(written)
    }
}

struct StreamState {
    inner: Option<BoxStream<'static, reqwest::Result<Bytes>>>,
    filename: String,
    url: String,
    expected: Option<u64>,
    transferred: u64,
}

impl StreamState {
    fn finish(&mut self) {
        self.inner = None;
        match self.expected {
            Some(expected) if expected != self.transferred => warn!(
                "{}: upstream announced {} bytes but sent {}",
                self.filename, expected, self.transferred
            ),
            _ => info!("{}: {} bytes downloaded", self.filename, self.transferred),
        }
    }
}
