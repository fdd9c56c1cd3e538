//! Table-analysis endpoint: model-generated insights over table samples.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{AnalyzeRequest, AnalyzeResponse};
use axum::{extract::State, Json};
use datasage_llm::{TableAnalysis, TableContext};
use datasage_store::{introspect, DatasetStore};
use std::sync::Arc;

/// Rows sampled per table for analysis.
const ANALYSIS_SAMPLE_ROWS: u32 = 20;

/// POST /api/analyze
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let entry = state
        .datasets
        .get(request.dataset_id)
        .ok_or_else(|| ApiError::dataset_not_found(request.dataset_id))?;
    let store = DatasetStore::open(&entry.path)?;

    let targets = if request.tables.is_empty() {
        introspect::list_tables(store.conn())?
    } else {
        request.tables.clone()
    };

    let mut contexts = Vec::new();
    for table in &targets {
        let columns = match introspect::table_columns(store.conn(), table) {
            Ok(columns) if !columns.is_empty() => columns,
            Ok(_) | Err(_) => {
                tracing::warn!(table = %table, "skipping unknown or empty table");
                continue;
            }
        };
        let rows = introspect::sample_rows(store.conn(), table, ANALYSIS_SAMPLE_ROWS)?;
        contexts.push(TableContext {
            table: table.clone(),
            columns,
            rows,
        });
    }

    if contexts.is_empty() {
        return Ok(Json(AnalyzeResponse {
            status: "success",
            analysis: TableAnalysis {
                summary: "No data found.".to_string(),
                ..Default::default()
            },
        }));
    }

    let analysis = state.provider.analyze_tables(&contexts).await?;
    Ok(Json(AnalyzeResponse {
        status: "success",
        analysis,
    }))
}

// =============================================================================
// TESTS
// =============================================================================
