//! Request and response bodies for the API surface.

use datasage_core::{DatabaseState, PipelineLog, QueryRecord, Row, TableInfo};
use datasage_llm::TableAnalysis;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ask-a-question request. Absent `question` means "fetch current state
/// only, do not run the agent". Absent or blank `schema` is synthesized
/// from the store.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AskRequest {
    pub question: Option<String>,
    pub schema: Option<String>,
    pub dataset_id: Option<Uuid>,
    /// Direct dataset file-path reference; takes precedence over
    /// `dataset_id` when both are present.
    pub db_file_path: Option<String>,
    #[serde(default)]
    pub restricted_columns: Vec<String>,
}

/// Ask-a-question response. Terminal agent failure is still a success
/// response carrying `valid: false` plus the last SQL and feedback.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AskResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Vec<Object>>))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<Vec<Row>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    pub database_state: DatabaseState,
    pub logs: PipelineLog,
    /// Produced on success, ready for external persistence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_record: Option<QueryRecord>,
}

/// Query-string options shared by ingest and append.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IngestQuery {
    /// Run the best-effort normalization pass after loading.
    #[serde(default)]
    pub clean: bool,
}

/// Ingest / append response.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IngestResponse {
    pub status: &'static str,
    pub message: String,
    pub schema: String,
    pub database_state: DatabaseState,
    pub tables: Vec<TableInfo>,
    pub dataset_id: Uuid,
}

/// Delete-table response.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeleteTableResponse {
    pub status: &'static str,
    pub table: String,
}

/// Table-analysis request. An empty `tables` list means "analyze every
/// table in the dataset".
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnalyzeRequest {
    pub dataset_id: Uuid,
    #[serde(default)]
    pub tables: Vec<String>,
}

/// Table-analysis response.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnalyzeResponse {
    pub status: &'static str,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub analysis: TableAnalysis,
}
