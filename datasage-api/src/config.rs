//! Environment-driven configuration.

use crate::error::{ApiError, ApiResult};
use datasage_llm::{GeminiProvider, ModelProvider};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: &str = "3000";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
}

impl ApiConfig {
    pub fn from_env() -> ApiResult<Self> {
        Self::from_parts(
            std::env::var("DATASAGE_API_BIND").ok(),
            std::env::var("PORT")
                .ok()
                .or_else(|| std::env::var("DATASAGE_API_PORT").ok()),
            std::env::var("DATASAGE_UPLOAD_DIR").ok(),
        )
    }

    fn from_parts(
        host: Option<String>,
        port: Option<String>,
        upload_dir: Option<String>,
    ) -> ApiResult<Self> {
        let port_str = port.unwrap_or_else(|| DEFAULT_PORT.to_string());
        let port = port_str
            .parse::<u16>()
            .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;
        Ok(Self {
            host: host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            upload_dir: PathBuf::from(upload_dir.unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string())),
        })
    }

    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
    }
}

/// Model provider configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub model: String,
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            model: std::env::var("DATASAGE_MODEL")
                .ok()
                .filter(|model| !model.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Build the provider, failing when no API key is configured.
    pub fn build(&self) -> ApiResult<Arc<dyn ModelProvider>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ApiError::provider_unavailable("GEMINI_API_KEY is not set; no model provider configured")
        })?;
        Ok(Arc::new(GeminiProvider::new(api_key, &self.model)))
    }
}

// =============================================================================
// TESTS
// =============================================================================
