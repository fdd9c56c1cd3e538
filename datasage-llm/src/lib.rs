//! Datasage LLM - Model Provider Abstraction
//!
//! Provider-agnostic trait for every model-backed role in the pipeline:
//! SQL generation, validation review, relevance checking, titling, table
//! naming, cleanup proposals, and table analysis. The trait is injected
//! where needed (never a process-wide singleton) so tests can substitute
//! deterministic fakes.

pub mod prompts;
pub mod providers;

use async_trait::async_trait;
use datasage_core::{DatasageResult, GenerationOutcome, Row};
use serde::{Deserialize, Serialize};

pub use providers::gemini::GeminiProvider;

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

/// Input to one SQL generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlGeneration {
    /// The natural-language question.
    pub question: String,
    /// DDL-like schema text.
    pub schema: String,
    /// Feedback from the previous attempt; empty on the first.
    pub feedback: String,
    /// Rendered required-columns block ("ALL COLUMNS ALLOWED" when the
    /// caller pinned nothing).
    pub allowed_columns: String,
}

/// Validator verdict on a candidate query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlReview {
    /// Whether the query is valid against the schema and dialect rules.
    pub valid: bool,
    /// Free-text reasoning; becomes the next attempt's feedback on
    /// rejection.
    pub reasoning: String,
}

/// Soft-gate verdict on whether a question is answerable from a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceVerdict {
    pub relevant: bool,
    pub reasoning: String,
}

/// Sample of one table handed to the analysis role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableContext {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Structured analysis of one or more tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableAnalysis {
    pub summary: String,
    pub trends: Vec<String>,
    pub anomalies: Vec<String>,
    pub questions: Vec<String>,
}

// ============================================================================
// MODEL PROVIDER TRAIT
// ============================================================================

/// One method per model-backed role. Implementations must be thread-safe
/// (Send + Sync); the pipeline holds them as `Arc<dyn ModelProvider>`.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Produce candidate SQL (or a structured missing-columns signal) for
    /// a question against a schema.
    ///
    /// The generator must reference only identifiers present in the
    /// schema with exact casing and quoting, alias computed aggregates,
    /// cast text-stored numerics before aggregating, and include every
    /// required column literally in the projection. When a needed column
    /// is absent from the schema it returns
    /// [`GenerationOutcome::MissingColumns`] instead of inventing one.
    async fn generate_sql(&self, input: &SqlGeneration) -> DatasageResult<GenerationOutcome>;

    /// Review a candidate query against the schema: syntax, identifier
    /// existence, join soundness, and SQLite dialect rules (no date
    /// extraction functions, case-insensitive LIKE over opaque date
    /// strings, strip-and-cast for text-stored numerics).
    async fn review_sql(&self, sql: &str, schema: &str) -> DatasageResult<SqlReview>;

    /// Estimate whether the question is answerable from this schema.
    /// Providers must default to relevant under uncertainty.
    async fn check_relevance(&self, question: &str, schema: &str)
        -> DatasageResult<RelevanceVerdict>;

    /// Summarize a question into a short, clean title (3-6 words).
    async fn title_question(&self, question: &str) -> DatasageResult<String>;

    /// Suggest a concise snake_case table name for an uploaded file.
    async fn suggest_table_name(
        &self,
        filename: &str,
        headers: &[String],
    ) -> DatasageResult<String>;

    /// Propose cleanup UPDATE statements (whitespace trimming,
    /// blank-to-null, date standardization, typo fixes) from a sample of
    /// rows. Best-effort: callers swallow execution failures.
    async fn propose_cleanup(
        &self,
        table: &str,
        columns: &[String],
        sample_rows: &[Row],
    ) -> DatasageResult<Vec<String>>;

    /// Analyze table samples for trends, anomalies, and suggested
    /// questions. Multi-table input should surface cross-table
    /// relationships.
    async fn analyze_tables(&self, contexts: &[TableContext]) -> DatasageResult<TableAnalysis>;
}

// =============================================================================
// TESTS
// =============================================================================
