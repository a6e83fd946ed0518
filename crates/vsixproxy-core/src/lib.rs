//! vsixproxy Core - Marketplace resolution
//!
//! This crate resolves marketplace extensions from their item page and
//! proxies package downloads. It holds no state between requests: every
//! resolution fetches the page again and every download streams straight
//! from upstream.

mod error;
mod extractor;
mod identifier;
mod link;
mod pipeline;
mod proxy;
mod resolver;

pub use error::*;
pub use extractor::*;
pub use identifier::*;
pub use link::*;
pub use pipeline::*;
pub use proxy::*;
pub use resolver::*;

use reqwest::Client;
use std::time::Duration;
use vsixproxy_types::ResolvedItem;

/// User agent sent with every upstream request
pub const USER_AGENT: &str = concat!("vsixproxy/", env!("CARGO_PKG_VERSION"));

/// The main vsixproxy core instance
#[derive(Debug, Clone)]
pub struct VsixProxyCore {
    pipeline: ResolutionPipeline,
    proxy: DownloadProxy,
}

impl VsixProxyCore {
    /// Create a core instance with a shared HTTP client
    pub fn new(links: LinkBuilder) -> Result<Self, VsixError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self::with_client(links, client))
    }

    /// Create a core instance around an existing client
    pub fn with_client(links: LinkBuilder, client: Client) -> Self {
        Self {
            pipeline: ResolutionPipeline::new(links, MetadataExtractor::new(client.clone())),
            proxy: DownloadProxy::new(client),
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Resolve an extension to its concrete version and links
    pub async fn resolve(
        &self,
        triple: &IdentifierTriple,
        scheme: &str,
        host: &str,
    ) -> Result<ResolvedItem, VsixError> {
        self.pipeline.resolve_item(triple, scheme, host).await
    }

    /// Resolve an extension and start fetching its package
    pub async fn open_download(
        &self,
        triple: &IdentifierTriple,
        scheme: &str,
        host: &str,
    ) -> Result<PreparedDownload, VsixError> {
        let item = self.resolve(triple, scheme, host).await?;
        self.proxy.open(&item).await
    }

    pub fn proxy(&self) -> &DownloadProxy {
        &self.proxy
    }
}
