//! Resolution Pipeline
//!
//! Link Builder -> Metadata Extractor -> Version Resolver. Any failure aborts
//! the whole resolution; no partial item is ever produced.

use crate::error::VsixError;
use crate::extractor::MetadataExtractor;
use crate::identifier::IdentifierTriple;
use crate::link::LinkBuilder;
use crate::resolver::resolve_version;
use tracing::{info, warn};
use vsixproxy_types::{MetadataRecord, ResolvedItem};

/// Turns an identifier triple into a fully resolved item
#[derive(Debug, Clone)]
pub struct ResolutionPipeline {
    links: LinkBuilder,
    extractor: MetadataExtractor,
}

impl ResolutionPipeline {
    pub fn new(links: LinkBuilder, extractor: MetadataExtractor) -> Self {
        Self { links, extractor }
    }

    /// Resolve `triple` against the marketplace.
    ///
    /// `scheme` and `host` describe how the caller reached this service and
    /// are only used to build the self-referential download link. Every call
    /// performs its own page fetch.
    pub async fn resolve_item(
        &self,
        triple: &IdentifierTriple,
        scheme: &str,
        host: &str,
    ) -> Result<ResolvedItem, VsixError> {
        let display_link = self.links.display_link(triple)?;
        let details = self.extractor.extract(&display_link).await?;
        self.complete(triple, display_link, details, scheme, host)
    }

    /// Build the item once the metadata is known
    fn complete(
        &self,
        triple: &IdentifierTriple,
        display_link: String,
        details: MetadataRecord,
        scheme: &str,
        host: &str,
    ) -> Result<ResolvedItem, VsixError> {
        let version = resolve_version(&details, triple.version())?;
        if triple.version().is_some() && details.find_version(&version).is_none() {
            warn!(
                "Requested version {} of {} is not listed by the marketplace",
                version, triple
            );
        }

        // Unpinned versions come from the marketplace payload, not the caller
        let resolved = triple.with_version(&version).map_err(|e| match triple.version() {
            Some(_) => e,
            None => VsixError::Parse(format!("marketplace version '{}' is not usable", version)),
        })?;
        let download_link = self.links.download_link(&resolved)?;
        let api_download_link = api_download_link(
            scheme,
            host,
            triple.publisher(),
            triple.extension(),
            &version,
        );

        info!("Resolved {} -> {} ({})", triple, version, display_link);

        Ok(ResolvedItem {
            publisher: triple.publisher().to_string(),
            extension: triple.extension().to_string(),
            version,
            display_link,
            download_link,
            api_download_link,
            details,
        })
    }
}

/// Link callers use to fetch the package through this service
pub fn api_download_link(
    scheme: &str,
    host: &str,
    publisher: &str,
    extension: &str,
    version: &str,
) -> String {
    format!(
        "{}://{}/{}/{}/{}.VSIX",
        scheme, host, publisher, extension, version
    )
}
