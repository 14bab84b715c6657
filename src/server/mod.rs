//! Logwarden Server Module
//!
//! HTTP surface for the triage pipeline: accepts batches of raw log lines
//! (file upload, form text or JSON) and returns one finding per line.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::AppState;

use crate::bundle::ModelBundle;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or_else(|_| "./models/logwarden.bundle".to_string()),
        }
    }
}

/// Start the server with the given configuration.
///
/// The model bundle is loaded before binding; a missing or incompatible
/// artifact aborts startup rather than surfacing per request.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    info!(
        model_path = %config.model_path,
        started_at = %start_time.to_rfc3339(),
        "Loading model bundle"
    );

    let bundle = ModelBundle::load(&config.model_path)?;
    let state = Arc::new(AppState::new(config.clone(), bundle));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        address = %addr,
        "Logwarden server starting"
    );
    info!(url = %format!("http://{}/api/analyze", addr), "Analyze endpoint available");
    info!(url = %format!("http://{}/api/health", addr), "Health endpoint available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    // Graceful shutdown on ctrl+c
    let shutdown_signal = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        let stop_time = chrono::Utc::now();
        let uptime = stop_time.signed_duration_since(start_time);
        info!(
            stopped_at = %stop_time.to_rfc3339(),
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
