//! Extension identifiers as supplied by callers

use crate::error::VsixError;
use std::fmt;

/// Publisher, extension name and optional pinned version.
///
/// Constructed only through [`IdentifierTriple::new`], so every instance has
/// already passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierTriple {
    publisher: String,
    extension: String,
    version: Option<String>,
}

impl IdentifierTriple {
    /// Validate and build a triple
    pub fn new(
        publisher: impl Into<String>,
        extension: impl Into<String>,
        version: Option<String>,
    ) -> Result<Self, VsixError> {
        let publisher = publisher.into();
        let extension = extension.into();

        validate_name("publisher", &publisher)?;
        validate_name("extension", &extension)?;
        if let Some(version) = &version {
            validate_version(version)?;
        }

        Ok(Self {
            publisher,
            extension,
            version,
        })
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Pinned version, if the caller asked for one
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Copy of this triple pinned to a concrete version
    pub fn with_version(&self, version: impl Into<String>) -> Result<Self, VsixError> {
        Self::new(
            self.publisher.clone(),
            self.extension.clone(),
            Some(version.into()),
        )
    }
}

impl fmt::Display for IdentifierTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.publisher, self.extension)?;
        if let Some(version) = &self.version {
            write!(f, "@{}", version)?;
        }
        Ok(())
    }
}

fn validate_name(field: &str, value: &str) -> Result<(), VsixError> {
    if value.is_empty() {
        return Err(VsixError::InvalidIdentifier(format!("{} must not be empty", field)));
    }

    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(VsixError::InvalidIdentifier(format!(
            "{} '{}' contains invalid characters",
            field, value
        )));
    }
    Ok(())
}

/// Versions are restricted to digits and dots
fn validate_version(value: &str) -> Result<(), VsixError> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(VsixError::InvalidIdentifier(format!(
            "version '{}' must match [0-9.]+",
            value
        )));
    }
    Ok(())
}
