//! Error types for vsixproxy core

use thiserror::Error;

/// Errors that can occur while resolving or proxying an extension
#[derive(Debug, Error)]
pub enum VsixError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upstream returned {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("Metadata parse error: {0}")]
    Parse(String),

    #[error("No versions published for {0}")]
    EmptyVersionList(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VsixError {
    /// Whether the upstream marketplace could not be reached or refused the request
    pub fn is_fetch(&self) -> bool {
        matches!(self, VsixError::Network(_) | VsixError::UpstreamStatus { .. })
    }

    /// Upstream HTTP status, if this error carries one
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            VsixError::UpstreamStatus { status, .. } => Some(*status),
            VsixError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for VsixError {
    fn from(error: serde_json::Error) -> Self {
        VsixError::Parse(error.to_string())
    }
}
