//! Datasage API - REST layer
//!
//! Exposes the question-answering pipeline over HTTP: ask-a-question,
//! dataset ingest/append/delete-table, table analysis, and health
//! endpoints. Authentication, saved dashboards, and history browsing are
//! external collaborators and do not live here.

pub mod config;
pub mod error;
pub mod registry;
pub mod routes;
pub mod state;
pub mod types;

pub use config::{ApiConfig, ProviderConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use registry::{DatasetEntry, DatasetRegistry};
pub use routes::create_api_router;
pub use state::AppState;
