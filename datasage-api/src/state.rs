//! Shared application state for Axum routers.

use crate::registry::DatasetRegistry;
use datasage_llm::ModelProvider;
use std::path::PathBuf;
use std::sync::Arc;

/// Application-wide state shared across all routes.
pub struct AppState {
    /// The injected model provider; every model-backed role goes through
    /// it.
    pub provider: Arc<dyn ModelProvider>,
    /// Dataset id -> persisted store path.
    pub datasets: DatasetRegistry,
    /// Where uploaded files and dataset stores land.
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(provider: Arc<dyn ModelProvider>, upload_dir: PathBuf) -> Self {
        Self {
            provider,
            datasets: DatasetRegistry::new(),
            upload_dir,
        }
    }
}
