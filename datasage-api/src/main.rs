//! Datasage API Server Entry Point
//!
//! Bootstraps configuration, builds the model provider, and starts the
//! Axum HTTP server.

use std::sync::Arc;

use datasage_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, ProviderConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let api_config = ApiConfig::from_env()?;
    let provider = ProviderConfig::from_env().build()?;

    std::fs::create_dir_all(&api_config.upload_dir).map_err(|e| {
        ApiError::internal_error(format!(
            "Failed to create upload dir {}: {}",
            api_config.upload_dir.display(),
            e
        ))
    })?;

    let state = Arc::new(AppState::new(provider, api_config.upload_dir.clone()));
    let app = create_api_router(state);

    let addr = api_config.bind_addr()?;
    tracing::info!(%addr, "Starting Datasage API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
