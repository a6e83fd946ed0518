//! Version Resolver

use crate::error::VsixError;
use vsixproxy_types::MetadataRecord;

/// Pick the concrete version to operate on.
///
/// Without a request the marketplace's first entry wins; its ordering is
/// trusted as-is and no semver comparison happens. A requested version is
/// returned unchanged, even when the record doesn't list it.
pub fn resolve_version(
    record: &MetadataRecord,
    requested: Option<&str>,
) -> Result<String, VsixError> {
    if let Some(version) = requested {
        return Ok(version.to_string());
    }

    record
        .latest()
        .map(|v| v.version.clone())
        .ok_or_else(|| {
            let name = match record.publisher.publisher_name.as_str() {
                "" => record.extension_name.clone(),
                publisher => format!("{}.{}", publisher, record.extension_name),
            };
            VsixError::EmptyVersionList(name)
        })
}
