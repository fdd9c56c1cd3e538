//! The durable artifact of a successful ask.
//!
//! Storing and listing these records is an external collaborator's
//! responsibility; the pipeline only produces them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record of one answered question, ready for external persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QueryRecord {
    /// The question as asked.
    pub question: String,
    /// Short human-readable title (model-generated, with a truncation
    /// fallback).
    pub title: String,
    /// The SQL that answered the question.
    pub sql: String,
    /// Serialized summary of the result rows.
    pub result_summary: String,
    /// The dataset the question ran against, when known.
    pub dataset_id: Option<Uuid>,
}

impl QueryRecord {
    /// Fallback title when the model cannot produce one: the question,
    /// truncated to 50 characters.
    pub fn fallback_title(question: &str) -> String {
        if question.chars().count() > 50 {
            let head: String = question.chars().take(47).collect();
            format!("{}...", head)
        } else {
            question.to_string()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
