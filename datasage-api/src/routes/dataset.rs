//! Dataset lifecycle endpoints: multipart ingest, append, delete-table.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{DeleteTableResponse, IngestQuery, IngestResponse};
use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use datasage_store::{ingest, DatasetStore, IngestOptions, UploadedFile};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// At most this many files per upload request.
const MAX_UPLOAD_FILES: usize = 10;

/// POST /api/datasets?clean=
///
/// Multipart upload of one or more delimited files, merged into one new
/// dataset store.
pub async fn ingest_dataset(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IngestQuery>,
    multipart: Multipart,
) -> ApiResult<Json<IngestResponse>> {
    let files = save_uploads(&state, multipart).await?;
    if files.is_empty() {
        return Err(ApiError::missing_field("file"));
    }
    tracing::info!(count = files.len(), clean = query.clean, "ingest request");

    let store_path = state.upload_dir.join(format!("{}.sqlite", Uuid::now_v7()));
    let mut store = DatasetStore::open(&store_path)?;
    let report = ingest::ingest_batch(
        &mut store,
        state.provider.as_ref(),
        &files,
        IngestOptions { clean: query.clean },
    )
    .await?;

    let original_name = match files.len() {
        1 => files[0].original_name.clone(),
        n => format!("Merged dataset ({} files)", n),
    };
    let dataset_id = state.datasets.register(&store_path, &original_name);

    Ok(Json(IngestResponse {
        status: "success",
        message: format!("Ingested {} file(s)", files.len()),
        schema: report.schema,
        database_state: report.database_state,
        tables: report.tables,
        dataset_id,
    }))
}

/// POST /api/datasets/:id/append?clean=
///
/// One additional delimited file into an existing store.
pub async fn append_dataset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<IngestQuery>,
    multipart: Multipart,
) -> ApiResult<Json<IngestResponse>> {
    let entry = state
        .datasets
        .get(id)
        .ok_or_else(|| ApiError::dataset_not_found(id))?;

    let files = save_uploads(&state, multipart).await?;
    if files.is_empty() {
        return Err(ApiError::missing_field("file"));
    }
    if files.len() > 1 {
        return Err(ApiError::invalid_input(
            "Append accepts exactly one file per request",
        ));
    }

    let mut store = DatasetStore::open(&entry.path)?;
    let report = ingest::ingest_batch(
        &mut store,
        state.provider.as_ref(),
        &files,
        IngestOptions { clean: query.clean },
    )
    .await?;

    Ok(Json(IngestResponse {
        status: "success",
        message: "Table added successfully".to_string(),
        schema: report.schema,
        database_state: report.database_state,
        tables: report.tables,
        dataset_id: id,
    }))
}

/// DELETE /api/datasets/:id/tables/:table
///
/// Irreversible drop against the persisted store.
pub async fn delete_table(
    State(state): State<Arc<AppState>>,
    Path((id, table)): Path<(Uuid, String)>,
) -> ApiResult<Json<DeleteTableResponse>> {
    let entry = state
        .datasets
        .get(id)
        .ok_or_else(|| ApiError::dataset_not_found(id))?;
    if !entry.path.exists() {
        return Err(ApiError::dataset_not_found(id));
    }

    tracing::info!(dataset = %id, table = %table, "dropping table");
    let store = DatasetStore::open(&entry.path)?;
    store.drop_table(&table)?;

    Ok(Json(DeleteTableResponse {
        status: "success",
        table,
    }))
}

/// Drain the multipart body into the upload directory, keeping original
/// filenames for naming and format checks.
async fn save_uploads(state: &AppState, mut multipart: Multipart) -> ApiResult<Vec<UploadedFile>> {
    std::fs::create_dir_all(&state.upload_dir)
        .map_err(|e| ApiError::internal_error(format!("Failed to create upload dir: {}", e)))?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid_input(format!("Invalid multipart field: {}", e)))?
    {
        let Some(original_name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        if files.len() >= MAX_UPLOAD_FILES {
            remove_saved(&files);
            return Err(ApiError::invalid_input(format!(
                "At most {} files per upload",
                MAX_UPLOAD_FILES
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::invalid_input(format!("Invalid multipart field body: {}", e)))?;

        let base = PathBuf::from(&original_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let path = state.upload_dir.join(format!("{}-{}", Uuid::now_v7(), base));
        std::fs::write(&path, &bytes).map_err(|e| {
            remove_saved(&files);
            ApiError::internal_error(format!("Failed to save upload: {}", e))
        })?;

        files.push(UploadedFile {
            path,
            original_name,
        });
    }
    Ok(files)
}

fn remove_saved(files: &[UploadedFile]) {
    for file in files {
        if let Err(e) = std::fs::remove_file(&file.path) {
            tracing::warn!(path = %file.path.display(), error = %e, "failed to remove upload");
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use datasage_test_utils::ScriptedProvider;

    fn app_state(dir: &std::path::Path) -> (Arc<AppState>, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new());
        (
            Arc::new(AppState::new(provider.clone(), dir.to_path_buf())),
            provider,
        )
    }

    #[tokio::test]
    async fn test_delete_table_drops_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _provider) = app_state(dir.path());

        let store_path = dir.path().join("data.sqlite");
        let store = DatasetStore::open(&store_path).unwrap();
        store
            .conn()
            .execute_batch("CREATE TABLE doomed (a TEXT); INSERT INTO doomed VALUES ('x');")
            .unwrap();
        drop(store);
        let id = state.datasets.register(&store_path, "data.csv");

        let response = delete_table(
            State(state.clone()),
            Path((id, "doomed".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(response.0.table, "doomed");

        let store = DatasetStore::open(&store_path).unwrap();
        let remaining: i64 = store
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='doomed'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_delete_table_unknown_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _provider) = app_state(dir.path());

        let err = delete_table(
            State(state),
            Path((Uuid::now_v7(), "any".to_string())),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::DatasetNotFound);
    }
}
