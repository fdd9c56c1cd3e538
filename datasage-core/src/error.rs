//! Error types for Datasage operations

use std::path::PathBuf;
use thiserror::Error;

/// Model provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("No model provider configured")]
    ProviderNotConfigured,

    #[error("Request to {provider} failed: {message}")]
    ProviderError { provider: String, message: String },

    #[error("Rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("Invalid API key for {provider}")]
    InvalidApiKey { provider: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Sandbox session errors.
///
/// `SourceMissing` and `CopyFailed` are fatal for the owning request: the
/// session cannot be materialized, so no retry is attempted. `QueryFailed`
/// is the runtime-execution error the orchestrator feeds back to the
/// generator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SandboxError {
    #[error("Database file not found at path: {path}")]
    SourceMissing { path: PathBuf },

    #[error("Failed to copy database file {path}: {reason}")]
    CopyFailed { path: PathBuf, reason: String },

    #[error("Failed to open database: {reason}")]
    OpenFailed { reason: String },

    #[error("{reason}")]
    QueryFailed { reason: String },
}

/// Ingestion pipeline errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("Unsupported file format: {filename} (only delimited .csv files are accepted)")]
    UnsupportedFormat { filename: String },

    #[error("Multi-file ingestion requires every file to be a delimited .csv")]
    MixedBatch,

    #[error("Failed to parse {filename}: {reason}")]
    ParseFailed { filename: String, reason: String },

    #[error("Failed to load {filename} into table {table}: {reason}")]
    LoadFailed {
        filename: String,
        table: String,
        reason: String,
    },

    #[error("Store error: {reason}")]
    Store { reason: String },
}

/// Master error type for all Datasage operations.
#[derive(Debug, Clone, Error)]
pub enum DatasageError {
    #[error("Model error: {0}")]
    Llm(#[from] LlmError),

    #[error("Sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),
}

/// Result type alias for Datasage operations.
pub type DatasageResult<T> = Result<T, DatasageError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_error_display_source_missing() {
        let err = SandboxError::SourceMissing {
            path: PathBuf::from("/tmp/missing.sqlite"),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("not found"));
        assert!(msg.contains("/tmp/missing.sqlite"));
    }

    #[test]
    fn test_query_failed_display_is_bare_reason() {
        // The executor prefixes its own "Runtime Error:" marker; the error
        // itself must not add one.
        let err = SandboxError::QueryFailed {
            reason: "no such column: price".to_string(),
        };
        assert_eq!(format!("{}", err), "no such column: price");
    }

    #[test]
    fn test_ingest_error_display_mixed_batch() {
        let msg = format!("{}", IngestError::MixedBatch);
        assert!(msg.contains("every file"));
    }

    #[test]
    fn test_master_error_wraps_llm() {
        let err: DatasageError = LlmError::RateLimited {
            provider: "gemini".to_string(),
        }
        .into();
        assert!(matches!(err, DatasageError::Llm(_)));
        assert!(format!("{}", err).contains("Rate limited"));
    }

    #[test]
    fn test_master_error_wraps_sandbox() {
        let err: DatasageError = SandboxError::OpenFailed {
            reason: "locked".to_string(),
        }
        .into();
        assert!(format!("{}", err).contains("Sandbox error"));
    }
}
