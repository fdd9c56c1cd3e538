//! Error Types for the Datasage API
//!
//! Defines error handling for the API layer:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.
//! Only truly unrecoverable conditions (sandbox cannot be created,
//! dataset not found, provider unavailable) surface here; the agent's
//! terminal failure is a normal 200 response carrying valid=false.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use datasage_core::{DatasageError, IngestError, LlmError, SandboxError};
use serde::{Deserialize, Serialize};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses. Each maps to one HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request contains invalid input data
    InvalidInput,
    /// Required field is missing from request
    MissingField,
    /// Requested dataset does not exist
    DatasetNotFound,
    /// Requested table does not exist in the dataset
    TableNotFound,
    /// Internal server error
    InternalError,
    /// The model provider is unavailable or misconfigured
    ProviderUnavailable,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput | Self::MissingField => StatusCode::BAD_REQUEST,
            Self::DatasetNotFound | Self::TableNotFound => StatusCode::NOT_FOUND,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ProviderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

// ============================================================================
// API ERROR
// ============================================================================

/// Structured error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field missing: {}", field),
        )
    }

    pub fn dataset_not_found(id: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::DatasetNotFound,
            format!("Dataset not found: {}", id),
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderUnavailable, message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

impl From<DatasageError> for ApiError {
    fn from(err: DatasageError) -> Self {
        match &err {
            DatasageError::Sandbox(SandboxError::SourceMissing { .. }) => {
                Self::new(ErrorCode::DatasetNotFound, err.to_string())
            }
            DatasageError::Sandbox(
                SandboxError::CopyFailed { .. }
                | SandboxError::OpenFailed { .. }
                | SandboxError::QueryFailed { .. },
            ) => Self::internal_error(err.to_string()),
            DatasageError::Ingest(
                IngestError::UnsupportedFormat { .. }
                | IngestError::MixedBatch
                | IngestError::ParseFailed { .. },
            ) => Self::invalid_input(err.to_string()),
            DatasageError::Ingest(_) => Self::internal_error(err.to_string()),
            DatasageError::Llm(LlmError::ProviderNotConfigured) => {
                Self::provider_unavailable(err.to_string())
            }
            DatasageError::Llm(_) => Self::provider_unavailable(err.to_string()),
        }
    }
}

impl From<SandboxError> for ApiError {
    fn from(err: SandboxError) -> Self {
        DatasageError::from(err).into()
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        DatasageError::from(err).into()
    }
}

// =============================================================================
// TESTS
// =============================================================================
