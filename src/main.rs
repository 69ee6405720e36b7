mod caldav;
mod commands;
mod config;
mod resolve;
mod routes;
mod scan;
mod server;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::caldav::LibDavCalendarClient;
use crate::config::{AppConfig, Cli};
use crate::state::AppState;

/// Initialize logging; `RUST_LOG` overrides the default `info` filter.
fn init_logging() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")?;
    Ok(())
}

/// No .env at all: the process environment is used as is.
fn dotenv_missing(err: &dotenvy::Error) -> bool {
    matches!(err, dotenvy::Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv_override();
    init_logging()?;
    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) if dotenv_missing(&e) => {}
        Err(e) => warn!(error = %e, "Ignoring malformed .env"),
    }

    let config = AppConfig::from_cli(Cli::parse())?;
    info!(
        caldav_url = %config.caldav_url,
        account = %config.apple_id,
        default_tzid = config.default_tzid.as_deref().unwrap_or("UTC"),
        profile = ?config.profile,
        tools = ?config.profile.tool_names(),
        scan_days = config.scan_days,
        "Loaded configuration"
    );

    let client = Arc::new(LibDavCalendarClient::new(
        config.caldav_url.clone(),
        &config.apple_id,
        &config.password,
    )?);
    let addr = config.bind_address();
    let app = routes::app(AppState::new(config, client));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("caldav-mcp listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
