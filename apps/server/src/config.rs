//! Server configuration

use std::net::{IpAddr, SocketAddr};
use thiserror::Error;
use vsixproxy_core::{LinkBuilder, LinkTemplate, VsixError};

/// Port used when none is configured
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid port '{0}'")]
    InvalidPort(String),

    #[error(transparent)]
    Template(#[from] VsixError),
}

/// Everything needed to start serving
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub links: LinkBuilder,
}

impl ServerConfig {
    pub fn new(
        host: IpAddr,
        port: Option<&str>,
        page_template: &str,
        download_template: &str,
    ) -> Result<Self, ConfigError> {
        let port = resolve_port(port)?;
        let links = LinkBuilder::new(
            LinkTemplate::parse(page_template)?,
            LinkTemplate::parse(download_template)?,
        )?;

        Ok(Self {
            addr: SocketAddr::new(host, port),
            links,
        })
    }
}

/// Parse the configured port; unset or blank means [`DEFAULT_PORT`]
pub fn resolve_port(value: Option<&str>) -> Result<u16, ConfigError> {
    match value.map(str::trim) {
        None | Some("") => Ok(DEFAULT_PORT),
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidPort(raw.to_string())),
    }
}
