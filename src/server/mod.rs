//! Development web server for the timeline site.
//!
//! Serves the site's static files with:
//! - No-cache headers on scripts, stylesheets and pages, so data edits show up
//!   on reload
//! - One-hour caching for images
//! - A wildcard CORS header on every response
//! - One timestamped log line per request

mod routes;

pub use routes::{cache_control_for, create_router};

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

use crate::config::Settings;

/// Shared state for the web server.
#[derive(Debug, Clone)]
pub struct AppState {
    pub root: PathBuf,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let root = settings
            .serve_root
            .canonicalize()
            .with_context(|| format!("cannot serve {}", settings.serve_root.display()))?;
        Ok(Self { root })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state.clone());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting timeline server at http://{}", addr);
    tracing::info!("Serving files from {}", state.root.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
