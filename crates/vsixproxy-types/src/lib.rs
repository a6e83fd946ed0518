//! Shared types for vsixproxy
//!
//! This crate contains the data structures exchanged between the core
//! resolution pipeline and the HTTP server: the marketplace metadata record
//! as it is embedded in the item page, and the resolved item returned to
//! callers.
//!
//! All records serialize with camelCase keys, the same casing the marketplace
//! uses for the embedded metadata. The resolved item therefore reads
//! `displayLink`, `downloadLink`, `apiDownloadLink` and `details`; it is not
//! wire-compatible with services that emit PascalCase keys such as `Link`
//! or `APIDownloadLink`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Asset type of the installable package inside a version's file list
pub const VSIX_PACKAGE_ASSET: &str = "Microsoft.VisualStudio.Services.VSIXPackage";

/// Treat an explicit JSON `null` like a missing field
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Marketplace Metadata
// ============================================================================

/// Metadata describing a marketplace extension and all of its versions.
///
/// Decoded from the JSON data island embedded in the marketplace item page.
/// Every field except `versions` defaults when absent or null so that
/// changes to the marketplace payload don't break decoding, while a page
/// without a version list is rejected outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    #[serde(default, deserialize_with = "nullable")]
    pub publisher: PublisherRecord,
    #[serde(default, deserialize_with = "nullable")]
    pub extension_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub extension_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub display_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub flags: String,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable")]
    pub short_description: String,
    /// Ordered newest first; index 0 is the version served by default
    pub versions: Vec<VersionRecord>,
    #[serde(default, deserialize_with = "nullable")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub statistics: Vec<Statistic>,
    #[serde(default, deserialize_with = "nullable")]
    pub installation_targets: Vec<InstallationTarget>,
    #[serde(default, deserialize_with = "nullable")]
    pub deployment_type: i32,
}

impl MetadataRecord {
    /// The primary version entry, as ordered by the marketplace
    pub fn latest(&self) -> Option<&VersionRecord> {
        self.versions.first()
    }

    /// Look up a version entry by its exact version string
    pub fn find_version(&self, version: &str) -> Option<&VersionRecord> {
        self.versions.iter().find(|v| v.version == version)
    }
}

/// Publisher sub-record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherRecord {
    #[serde(default, deserialize_with = "nullable")]
    pub publisher_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub publisher_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub display_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub flags: String,
}

/// A single published version of an extension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    #[serde(default, deserialize_with = "nullable")]
    pub version: String,
    #[serde(default, deserialize_with = "nullable")]
    pub flags: String,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable")]
    pub files: Vec<FileRecord>,
    #[serde(default, deserialize_with = "nullable")]
    pub asset_uri: String,
    #[serde(default, deserialize_with = "nullable")]
    pub fallback_asset_uri: String,
}

impl VersionRecord {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Location of a named asset for this version.
    ///
    /// Prefers an explicit file entry, then the primary asset base URI,
    /// then the fallback one.
    pub fn asset_url(&self, asset_type: &str) -> Option<String> {
        if let Some(file) = self.files.iter().find(|f| f.asset_type == asset_type) {
            return Some(file.source.clone());
        }

        [&self.asset_uri, &self.fallback_asset_uri]
            .into_iter()
            .find(|base| !base.is_empty())
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), asset_type))
    }
}

/// One named asset belonging to a version (package, icon, readme, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    #[serde(default, deserialize_with = "nullable")]
    pub asset_type: String,
    #[serde(default, deserialize_with = "nullable")]
    pub source: String,
}

/// A named statistic such as install count or average rating
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistic {
    #[serde(default, deserialize_with = "nullable")]
    pub statistic_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub value: f64,
}

/// A product the extension can be installed into
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationTarget {
    #[serde(default, deserialize_with = "nullable")]
    pub target: String,
    #[serde(default, deserialize_with = "nullable")]
    pub target_version: String,
}

// ============================================================================
// API Types
// ============================================================================

/// A fully resolved extension, as returned by the metadata endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedItem {
    pub publisher: String,
    pub extension: String,
    /// Concrete version the links point at
    pub version: String,
    /// Marketplace item page
    pub display_link: String,
    /// Upstream package location
    pub download_link: String,
    /// Link back into this service that proxies the package
    pub api_download_link: String,
    pub details: MetadataRecord,
}

impl ResolvedItem {
    /// File name offered to clients downloading the package
    pub fn package_filename(&self) -> String {
        format!("{}-{}.VSIX", self.extension, self.version)
    }
}

/// Structured error body returned by the HTTP surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code
    pub error: String,
    pub message: String,
}
