//! Predictor hub server module
//!
//! Serves one prediction page per registered model: a JSON form endpoint for
//! single predictions and a CSV upload endpoint for batches, with the results
//! downloadable as CSV.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::{AppState, ModelSlot};

use crate::schema::SchemaRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub models_dir: String,
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl ServerConfig {
    /// Build the configuration from `lookup`, falling back to defaults for
    /// unset or unparsable values
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("API_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            models_dir: lookup("MODELS_DIR").unwrap_or_else(|| "./models".to_string()),
            max_upload_size: lookup("MAX_UPLOAD_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(100 * 1024 * 1024), // 100MB
        }
    }
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    info!(
        models_dir = %config.models_dir,
        started_at = %start_time.to_rfc3339(),
        "Loading models"
    );

    let registry = SchemaRegistry::builtin()?;
    let state = Arc::new(AppState::load(config.clone(), registry));
    info!(
        available = state.available_count(),
        total = state.registry().pages().len(),
        "Model pages ready"
    );

    let app = create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        address = %addr,
        max_upload_size_mb = config.max_upload_size / 1024 / 1024,
        "Predictor hub starting"
    );
    info!(url = %format!("http://{}", addr), "Hub page available");
    info!(url = %format!("http://{}/api/models", addr), "Model listing available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received, stopping server gracefully");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
