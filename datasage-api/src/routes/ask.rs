//! Ask-a-question endpoint.
//!
//! Opens a sandbox session over the referenced dataset, synthesizes the
//! schema when the caller did not supply one, snapshots the store, and
//! drives the agent. The session is dropped on every exit path, which
//! deletes its working copy.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{AskRequest, AskResponse};
use axum::{extract::State, Json};
use datasage_agent::{AgentRequest, Orchestrator};
use datasage_core::{QueryRecord, RestrictedColumns};
use datasage_store::{introspect, SandboxSession};
use std::path::PathBuf;
use std::sync::Arc;

/// POST /api/ask
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> ApiResult<Json<AskResponse>> {
    let source = resolve_source(&state, &request)?;
    let session = SandboxSession::open(source.as_deref())?;

    let schema = match request.schema.as_deref() {
        Some(schema) if !schema.trim().is_empty() => schema.to_string(),
        _ => {
            tracing::debug!("schema missing in request, generating from store");
            introspect::schema_text(session.conn())?
        }
    };
    let database_state = introspect::database_state(session.conn())?;

    let question = match request
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
    {
        Some(question) => question.to_string(),
        None => {
            // State fetch only: no agent run.
            return Ok(Json(AskResponse {
                status: "success",
                sql: None,
                answer: None,
                feedback: None,
                valid: None,
                iterations: None,
                database_state,
                logs: Default::default(),
                query_record: None,
            }));
        }
    };

    tracing::info!(question = %question, "running question workflow");
    let agent_request = AgentRequest {
        question: question.clone(),
        schema,
        restricted_columns: RestrictedColumns::new(request.restricted_columns.clone()),
    };
    let outcome = Orchestrator::new(state.provider.clone())
        .run(&session, &agent_request)
        .await?;

    let query_record = match (&outcome.state.result, outcome.state.is_valid()) {
        (Some(rows), true) => {
            let title = match state.provider.title_question(&question).await {
                Ok(title) if !title.trim().is_empty() => title,
                Ok(_) => QueryRecord::fallback_title(&question),
                Err(e) => {
                    tracing::warn!(error = %e, "title generation failed, using fallback");
                    QueryRecord::fallback_title(&question)
                }
            };
            Some(QueryRecord {
                question: question.clone(),
                title,
                sql: outcome.state.sql.clone().unwrap_or_default(),
                result_summary: serde_json::to_string(rows).unwrap_or_else(|_| "[]".to_string()),
                dataset_id: request.dataset_id,
            })
        }
        _ => None,
    };

    Ok(Json(AskResponse {
        status: "success",
        sql: outcome.state.sql.clone(),
        answer: outcome.state.result.clone(),
        feedback: outcome.state.feedback.clone(),
        valid: outcome.state.valid,
        iterations: Some(outcome.state.iterations),
        database_state,
        logs: outcome.log,
        query_record,
    }))
}

/// The dataset file to open: an explicit path wins, then the registry;
/// neither means a transient in-memory store.
fn resolve_source(state: &AppState, request: &AskRequest) -> ApiResult<Option<PathBuf>> {
    if let Some(path) = request
        .db_file_path
        .as_deref()
        .filter(|p| !p.trim().is_empty())
    {
        return Ok(Some(PathBuf::from(path)));
    }
    if let Some(id) = request.dataset_id {
        let entry = state
            .datasets
            .get(id)
            .ok_or_else(|| ApiError::dataset_not_found(id))?;
        return Ok(Some(entry.path));
    }
    Ok(None)
}

// =============================================================================
// TESTS
// =============================================================================
