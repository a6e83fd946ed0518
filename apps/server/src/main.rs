//! vsixproxy - Marketplace extension resolver
//!
//! Serves extension metadata scraped from the marketplace item page and
//! proxies package downloads.

mod config;
mod error;
mod server;

use anyhow::{Context, Result};
use clap::Parser;
use config::ServerConfig;
use server::AppState;
use std::net::IpAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vsixproxy_core::{VsixProxyCore, DEFAULT_DISPLAY_TEMPLATE, DEFAULT_DOWNLOAD_TEMPLATE};

/// vsixproxy - resolve and download marketplace extensions
#[derive(Parser)]
#[command(name = "vsixproxy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Port to listen on (unset or empty means 8080)
    #[arg(long, env = "PORT")]
    port: Option<String>,

    /// Address to bind
    #[arg(long, env = "VSIXPROXY_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Marketplace item page template
    #[arg(long, env = "VSIXPROXY_PAGE_TEMPLATE", default_value = DEFAULT_DISPLAY_TEMPLATE)]
    page_template: String,

    /// Package download template
    #[arg(long, env = "VSIXPROXY_DOWNLOAD_TEMPLATE", default_value = DEFAULT_DOWNLOAD_TEMPLATE)]
    download_template: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = ServerConfig::new(
        cli.host,
        cli.port.as_deref(),
        &cli.page_template,
        &cli.download_template,
    )
    .context("invalid configuration")?;

    let core = VsixProxyCore::new(config.links.clone()).context("failed to build HTTP client")?;
    let state = AppState {
        core,
        fallback_host: config.addr.to_string(),
    };

    server::serve(state, config.addr, shutdown_signal()).await
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down");
}
