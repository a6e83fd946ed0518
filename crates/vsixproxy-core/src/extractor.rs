//! Metadata Extractor
//!
//! The marketplace item page embeds the extension metadata as a JSON data
//! island inside an element carrying the `vss-extension` class. Nothing else
//! about the page layout is assumed.

use crate::error::VsixError;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use vsixproxy_types::MetadataRecord;

/// CSS selector for the element holding the metadata JSON
pub const METADATA_SELECTOR: &str = ".vss-extension";

/// Fetches marketplace pages and decodes their embedded metadata
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    client: Client,
}

impl MetadataExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch `display_link` and decode the metadata record it embeds.
    ///
    /// Issues exactly one GET. The response body is consumed in full before
    /// parsing, so the connection is released on every path.
    pub async fn extract(&self, display_link: &str) -> Result<MetadataRecord, VsixError> {
        debug!("Fetching marketplace page: {}", display_link);

        let response = self.client.get(display_link).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(VsixError::UpstreamStatus {
                status: status.as_u16(),
                url: display_link.to_string(),
            });
        }

        let body = response.text().await?;
        parse_page(&body)
    }
}

/// Decode the metadata record embedded in a marketplace page
pub fn parse_page(html: &str) -> Result<MetadataRecord, VsixError> {
    let selector = Selector::parse(METADATA_SELECTOR)
        .map_err(|e| VsixError::Parse(format!("invalid selector: {:?}", e)))?;

    let document = Html::parse_document(html);
    let element = document
        .select(&selector)
        .next()
        .ok_or_else(|| VsixError::Parse("page has no embedded extension metadata".to_string()))?;

    let content: String = element.text().collect();
    let content = content.trim();
    if content.is_empty() {
        return Err(VsixError::Parse("embedded extension metadata is empty".to_string()));
    }

    Ok(serde_json::from_str(content)?)
}
