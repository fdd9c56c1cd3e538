//! Tabular ingestion pipeline.
//!
//! Converts uploaded delimited text into typed tables inside a dataset
//! store. Each file is atomic at the table granularity: every row commits
//! or none do. The optional normalization pass is best-effort and can
//! never fail an ingestion.

use crate::introspect;
use crate::rows::quote_ident;
use crate::store::DatasetStore;
use datasage_core::{ColumnType, DatabaseState, IngestError, TableInfo};
use datasage_llm::ModelProvider;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Rows sampled for the normalization pass.
const CLEANUP_SAMPLE_ROWS: u32 = 5;
/// Upper bound on sanitized table-name length.
const MAX_TABLE_NAME_LEN: usize = 50;

/// One uploaded file: where it landed on disk plus the name the caller
/// gave it.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub path: PathBuf,
    pub original_name: String,
}

/// Ingestion options.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Run the best-effort normalization pass after loading.
    pub clean: bool,
}

/// What an ingestion produced: the derived schema text, the per-table
/// snapshot, and metadata for each table loaded in this call.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub schema: String,
    pub database_state: DatabaseState,
    pub tables: Vec<TableInfo>,
}

/// Parsed delimited file: header-derived column names and raw string
/// rows.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Whether a filename names a supported delimited file.
pub fn is_delimited(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".csv")
}

/// Parse a delimited file with header-derived column names, trimming
/// every value.
pub fn parse_delimited(path: &Path, original_name: &str) -> Result<ParsedFile, IngestError> {
    let parse_failed = |reason: String| IngestError::ParseFailed {
        filename: original_name.to_string(),
        reason,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| parse_failed(e.to_string()))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| parse_failed(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| parse_failed(e.to_string()))?;
        rows.push(record.iter().map(|v| v.to_string()).collect());
    }

    Ok(ParsedFile { headers, rows })
}

/// Infer one type per column: `Numeric` when every non-empty value parses
/// as a number and at least one non-empty value exists; `Text` otherwise.
pub fn infer_column_types(headers: &[String], rows: &[Vec<String>]) -> Vec<ColumnType> {
    (0..headers.len())
        .map(|idx| {
            let mut saw_value = false;
            for row in rows {
                let value = row.get(idx).map(String::as_str).unwrap_or("");
                if value.is_empty() {
                    continue;
                }
                saw_value = true;
                if value.parse::<f64>().is_err() {
                    return ColumnType::Text;
                }
            }
            if saw_value {
                ColumnType::Numeric
            } else {
                ColumnType::Text
            }
        })
        .collect()
}

/// Sanitize a model-suggested table name: lower-cased, alphanumeric and
/// underscore only, forced to start with a letter, bounded length.
/// Returns None when nothing usable survives.
pub fn sanitize_table_name(raw: &str) -> Option<String> {
    let cleaned = raw.replace("```", " ").replace('\n', " ");
    let mapped: String = cleaned
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if mapped.chars().all(|c| c == '_') {
        return None;
    }

    let mut name = if mapped.starts_with(|c: char| c.is_ascii_lowercase()) {
        mapped
    } else {
        format!("t_{}", mapped)
    };
    name.truncate(MAX_TABLE_NAME_LEN);

    (name.len() >= 2).then_some(name)
}

/// Deterministic fallback name from the source filename.
pub fn fallback_table_name(filename: &str) -> String {
    let stem = filename
        .rsplit_once('.')
        .map_or(filename, |(stem, _)| stem);
    let sanitized: String = stem
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.chars().all(|c| c == '_') {
        "table_upload".to_string()
    } else {
        let mut name = format!("table_{}", sanitized);
        name.truncate(MAX_TABLE_NAME_LEN);
        name
    }
}

/// Create the table (skipped when it already exists) and insert every row
/// inside one transaction. A failure rolls everything back, leaving any
/// pre-existing rows untouched.
fn load_table(
    conn: &mut Connection,
    table: &str,
    headers: &[String],
    types: &[ColumnType],
    rows: &[Vec<String>],
) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;

    let columns: Vec<String> = headers
        .iter()
        .zip(types)
        .map(|(header, ty)| format!("{} {}", quote_ident(header), ty.as_sql_type()))
        .collect();
    tx.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(table),
            columns.join(", ")
        ),
        [],
    )?;

    {
        let placeholders = vec!["?"; headers.len()].join(", ");
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} VALUES ({})",
            quote_ident(table),
            placeholders
        ))?;
        for row in rows {
            stmt.execute(rusqlite::params_from_iter(row.iter()))?;
        }
    }

    tx.commit()
}

/// Best-effort normalization pass: propose cleanup statements from a
/// sample of rows, then execute them. Every failure is swallowed - a
/// failed cleanup must never fail the ingestion.
async fn run_cleanup(store: &DatasetStore, provider: &dyn ModelProvider, table: &str) {
    let sample = match introspect::sample_rows(store.conn(), table, CLEANUP_SAMPLE_ROWS) {
        Ok(rows) if !rows.is_empty() => rows,
        Ok(_) => return,
        Err(e) => {
            tracing::warn!(table, error = %e, "cleanup sampling failed");
            return;
        }
    };
    let columns = match introspect::table_columns(store.conn(), table) {
        Ok(columns) => columns,
        Err(e) => {
            tracing::warn!(table, error = %e, "cleanup column listing failed");
            return;
        }
    };

    let statements = match provider.propose_cleanup(table, &columns, &sample).await {
        Ok(statements) => statements,
        Err(e) => {
            tracing::warn!(table, error = %e, "cleanup proposal failed");
            return;
        }
    };

    for statement in statements {
        if let Err(e) = store.conn().execute_batch(&statement) {
            tracing::warn!(table, statement, error = %e, "cleanup statement failed");
        }
    }
}

/// Ingest one delimited file into the store. Returns None for files with
/// no data rows (no table is created).
pub async fn ingest_file(
    store: &mut DatasetStore,
    provider: &dyn ModelProvider,
    file: &UploadedFile,
    options: IngestOptions,
) -> Result<Option<TableInfo>, IngestError> {
    let parsed = parse_delimited(&file.path, &file.original_name)?;
    if parsed.rows.is_empty() {
        tracing::warn!(file = %file.original_name, "no data rows, skipping");
        return Ok(None);
    }

    let types = infer_column_types(&parsed.headers, &parsed.rows);

    let table = match provider
        .suggest_table_name(&file.original_name, &parsed.headers)
        .await
    {
        Ok(suggestion) => sanitize_table_name(&suggestion)
            .unwrap_or_else(|| fallback_table_name(&file.original_name)),
        Err(e) => {
            tracing::warn!(file = %file.original_name, error = %e, "name suggestion failed, using fallback");
            fallback_table_name(&file.original_name)
        }
    };

    load_table(
        store.conn_mut(),
        &table,
        &parsed.headers,
        &types,
        &parsed.rows,
    )
    .map_err(|e| IngestError::LoadFailed {
        filename: file.original_name.clone(),
        table: table.clone(),
        reason: e.to_string(),
    })?;

    if options.clean {
        run_cleanup(store, provider, &table).await;
    }

    Ok(Some(TableInfo {
        name: table,
        columns: parsed.headers.iter().cloned().zip(types).collect(),
        row_count: parsed.rows.len(),
    }))
}

/// Ingest a batch of files into one store, one table per file.
///
/// File-type heterogeneity is detected up front: any non-delimited file
/// rejects the whole batch before any work starts, and every uploaded
/// temporary file is removed. On success the uploaded temporaries are
/// removed as well (the store now holds the data).
pub async fn ingest_batch(
    store: &mut DatasetStore,
    provider: &dyn ModelProvider,
    files: &[UploadedFile],
    options: IngestOptions,
) -> Result<IngestReport, IngestError> {
    if let Some(bad) = files.iter().find(|f| !is_delimited(&f.original_name)) {
        let err = if files.len() == 1 {
            IngestError::UnsupportedFormat {
                filename: bad.original_name.clone(),
            }
        } else {
            IngestError::MixedBatch
        };
        remove_uploads(files);
        return Err(err);
    }

    let mut tables = Vec::new();
    for file in files {
        if let Some(info) = ingest_file(store, provider, file, options).await? {
            tables.push(info);
        }
    }
    remove_uploads(files);

    Ok(IngestReport {
        schema: introspect::schema_text(store.conn()).map_err(store_error)?,
        database_state: introspect::database_state(store.conn()).map_err(store_error)?,
        tables,
    })
}

fn remove_uploads(files: &[UploadedFile]) {
    for file in files {
        if let Err(e) = std::fs::remove_file(&file.path) {
            tracing::warn!(path = %file.path.display(), error = %e, "failed to remove uploaded file");
        }
    }
}

fn store_error(e: datasage_core::SandboxError) -> IngestError {
    IngestError::Store {
        reason: e.to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use datasage_test_utils::{write_csv, ScriptedProvider};
    use proptest::prelude::*;

    fn open_store(dir: &Path) -> DatasetStore {
        DatasetStore::open(&dir.join("data.sqlite")).unwrap()
    }

    fn table_count(store: &DatasetStore, table: &str) -> i64 {
        store
            .conn()
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
                [],
                |row| row.get(0),
            )
            .unwrap()
    }

    // ------------------------------------------------------------------
    // Type inference
    // ------------------------------------------------------------------

    #[test]
    fn test_infer_numeric_column() {
        let headers = vec!["a".to_string()];
        let rows = vec![
            vec!["1".to_string()],
            vec!["2.5".to_string()],
            vec!["-3e2".to_string()],
        ];
        assert_eq!(infer_column_types(&headers, &rows), vec![ColumnType::Numeric]);
    }

    #[test]
    fn test_infer_empty_values_do_not_break_numeric() {
        let headers = vec!["a".to_string()];
        let rows = vec![
            vec!["1".to_string()],
            vec!["".to_string()],
            vec!["3".to_string()],
        ];
        assert_eq!(infer_column_types(&headers, &rows), vec![ColumnType::Numeric]);
    }

    #[test]
    fn test_infer_mixed_column_is_text() {
        let headers = vec!["a".to_string()];
        let rows = vec![
            vec!["1".to_string()],
            vec!["".to_string()],
            vec!["abc".to_string()],
        ];
        assert_eq!(infer_column_types(&headers, &rows), vec![ColumnType::Text]);
    }

    #[test]
    fn test_infer_all_empty_column_is_text() {
        let headers = vec!["a".to_string()];
        let rows = vec![vec!["".to_string()], vec!["".to_string()]];
        assert_eq!(infer_column_types(&headers, &rows), vec![ColumnType::Text]);
    }

    #[test]
    fn test_infer_formatted_number_is_text() {
        // "1,200.50" does not parse as a number; casting it is the
        // generator's job at query time.
        let headers = vec!["a".to_string()];
        let rows = vec![vec!["1,200.50".to_string()]];
        assert_eq!(infer_column_types(&headers, &rows), vec![ColumnType::Text]);
    }

    proptest! {
        #[test]
        fn prop_numeric_iff_every_nonempty_value_parses(
            values in proptest::collection::vec("[a-z0-9.]{0,6}", 1..20)
        ) {
            let headers = vec!["col".to_string()];
            let rows: Vec<Vec<String>> = values.iter().map(|v| vec![v.clone()]).collect();
            let inferred = infer_column_types(&headers, &rows)[0];

            let non_empty: Vec<&String> = values.iter().filter(|v| !v.is_empty()).collect();
            let expected = if !non_empty.is_empty()
                && non_empty.iter().all(|v| v.parse::<f64>().is_ok())
            {
                ColumnType::Numeric
            } else {
                ColumnType::Text
            };
            prop_assert_eq!(inferred, expected);
        }
    }

    // ------------------------------------------------------------------
    // Naming
    // ------------------------------------------------------------------

    #[test]
    fn test_sanitize_lowercases_and_maps_punctuation() {
        assert_eq!(
            sanitize_table_name("Monthly Sales-2023").as_deref(),
            Some("monthly_sales_2023")
        );
    }

    #[test]
    fn test_sanitize_prefixes_leading_digit() {
        assert_eq!(sanitize_table_name("2023_sales").as_deref(), Some("t_2023_sales"));
    }

    #[test]
    fn test_sanitize_strips_fences_and_newlines() {
        assert_eq!(
            sanitize_table_name("```\nsales\n```").as_deref(),
            Some("sales")
        );
    }

    #[test]
    fn test_sanitize_rejects_degenerate_names() {
        assert_eq!(sanitize_table_name(""), None);
        assert_eq!(sanitize_table_name("___"), None);
        assert_eq!(sanitize_table_name("!!"), None);
    }

    #[test]
    fn test_fallback_name_from_filename() {
        assert_eq!(fallback_table_name("My Data (v2).csv"), "table_my_data__v2_");
        assert_eq!(fallback_table_name("???.csv"), "table_upload");
    }

    proptest! {
        #[test]
        fn prop_sanitized_names_are_valid_identifiers(raw in ".{0,80}") {
            if let Some(name) = sanitize_table_name(&raw) {
                prop_assert!(name.len() >= 2);
                prop_assert!(name.len() <= MAX_TABLE_NAME_LEN);
                prop_assert!(name.starts_with(|c: char| c.is_ascii_lowercase()));
                prop_assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
            }
        }
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_ingest_three_column_file_types_and_count() {
        // One all-integer column -> numeric; the other two -> text.
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(
            dir.path(),
            "budget.csv",
            "item,cost,note",
            &[
                "rent,900,flat",
                "food,120,groceries",
                "bus,30,monthly pass",
                "gym,45,",
                "misc,10,various",
            ],
        );
        let mut store = open_store(dir.path());
        let provider = ScriptedProvider::new();
        provider.push_table_name("budget");

        let info = ingest_file(
            &mut store,
            &provider,
            &UploadedFile {
                path: csv,
                original_name: "budget.csv".to_string(),
            },
            IngestOptions::default(),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(info.name, "budget");
        assert_eq!(info.row_count, 5);
        assert_eq!(
            info.columns,
            vec![
                ("item".to_string(), ColumnType::Text),
                ("cost".to_string(), ColumnType::Numeric),
                ("note".to_string(), ColumnType::Text),
            ]
        );
        assert_eq!(table_count(&store, "budget"), 5);
    }

    #[tokio::test]
    async fn test_ingest_uses_fallback_when_suggestion_errors() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(dir.path(), "Q3 Report.csv", "a", &["1"]);
        let mut store = open_store(dir.path());
        let provider = ScriptedProvider::new(); // empty queue -> suggestion errors

        let info = ingest_file(
            &mut store,
            &provider,
            &UploadedFile {
                path: csv,
                original_name: "Q3 Report.csv".to_string(),
            },
            IngestOptions::default(),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(info.name, "table_q3_report");
    }

    #[tokio::test]
    async fn test_ingest_skips_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(dir.path(), "empty.csv", "a,b", &[]);
        let mut store = open_store(dir.path());
        let provider = ScriptedProvider::new();

        let info = ingest_file(
            &mut store,
            &provider,
            &UploadedFile {
                path: csv,
                original_name: "empty.csv".to_string(),
            },
            IngestOptions::default(),
        )
        .await
        .unwrap();
        assert!(info.is_none());
        assert!(introspect::list_tables(store.conn()).unwrap().is_empty());
    }

    #[test]
    fn test_load_table_rolls_back_on_mid_insert_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(dir.path());
        let headers = vec!["a".to_string(), "b".to_string()];
        let types = vec![ColumnType::Text, ColumnType::Text];

        let good = vec![
            vec!["1".to_string(), "x".to_string()],
            vec!["2".to_string(), "y".to_string()],
        ];
        load_table(store.conn_mut(), "t", &headers, &types, &good).unwrap();
        assert_eq!(table_count(&store, "t"), 2);

        // Third row has the wrong arity: the whole second load must roll
        // back, leaving the first load's rows intact.
        let bad = vec![
            vec!["3".to_string(), "z".to_string()],
            vec!["only-one-value".to_string()],
        ];
        let err = load_table(store.conn_mut(), "t", &headers, &types, &bad);
        assert!(err.is_err());
        assert_eq!(table_count(&store, "t"), 2);
    }

    #[tokio::test]
    async fn test_ingest_same_name_appends_to_existing_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(dir.path());
        let provider = ScriptedProvider::new();
        provider.push_table_name("ledger").push_table_name("ledger");

        for name in ["jan.csv", "feb.csv"] {
            let csv = write_csv(dir.path(), name, "amount", &["1", "2"]);
            ingest_file(
                &mut store,
                &provider,
                &UploadedFile {
                    path: csv,
                    original_name: name.to_string(),
                },
                IngestOptions::default(),
            )
            .await
            .unwrap();
        }
        assert_eq!(table_count(&store, "ledger"), 4);
    }

    // ------------------------------------------------------------------
    // Cleanup pass
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_cleanup_statements_applied() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(dir.path(), "c.csv", "name", &["alice"]);
        let mut store = open_store(dir.path());
        let provider = ScriptedProvider::new();
        provider.push_table_name("people");
        provider.push_cleanup(vec!["UPDATE people SET name = UPPER(name);".to_string()]);

        ingest_file(
            &mut store,
            &provider,
            &UploadedFile {
                path: csv,
                original_name: "c.csv".to_string(),
            },
            IngestOptions { clean: true },
        )
        .await
        .unwrap();

        let name: String = store
            .conn()
            .query_row("SELECT name FROM people", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "ALICE");
    }

    #[tokio::test]
    async fn test_failed_cleanup_never_fails_ingestion() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(dir.path(), "c.csv", "name", &["x"]);
        let mut store = open_store(dir.path());
        let provider = ScriptedProvider::new();
        provider.push_table_name("people");
        provider.push_cleanup(vec!["UPDATE nonsense SET broken".to_string()]);

        let info = ingest_file(
            &mut store,
            &provider,
            &UploadedFile {
                path: csv,
                original_name: "c.csv".to_string(),
            },
            IngestOptions { clean: true },
        )
        .await
        .unwrap();
        assert!(info.is_some());
        assert_eq!(table_count(&store, "people"), 1);
    }

    // ------------------------------------------------------------------
    // Batch
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_batch_merges_files_into_one_store() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            UploadedFile {
                path: write_csv(dir.path(), "a.csv", "x", &["1"]),
                original_name: "a.csv".to_string(),
            },
            UploadedFile {
                path: write_csv(dir.path(), "b.csv", "y", &["2", "3"]),
                original_name: "b.csv".to_string(),
            },
        ];
        let mut store = open_store(dir.path());
        let provider = ScriptedProvider::new();
        provider.push_table_name("alpha").push_table_name("beta");

        let report = ingest_batch(&mut store, &provider, &files, IngestOptions::default())
            .await
            .unwrap();

        assert_eq!(report.tables.len(), 2);
        assert!(report.schema.contains("alpha"));
        assert!(report.schema.contains("beta"));
        assert_eq!(report.database_state["beta"].total, 2);
        // Uploaded temporaries were consumed.
        assert!(!files[0].path.exists());
        assert!(!files[1].path.exists());
    }

    #[tokio::test]
    async fn test_batch_rejects_mixed_formats_and_removes_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            UploadedFile {
                path: write_csv(dir.path(), "a.csv", "x", &["1"]),
                original_name: "a.csv".to_string(),
            },
            UploadedFile {
                path: write_csv(dir.path(), "b.xlsx", "y", &["2"]),
                original_name: "b.xlsx".to_string(),
            },
        ];
        let mut store = open_store(dir.path());
        let provider = ScriptedProvider::new();

        let err = ingest_batch(&mut store, &provider, &files, IngestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::MixedBatch));
        assert!(!files[0].path.exists());
        assert!(!files[1].path.exists());
        assert!(introspect::list_tables(store.conn()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_unsupported_file_is_named() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![UploadedFile {
            path: write_csv(dir.path(), "data.parquet", "x", &["1"]),
            original_name: "data.parquet".to_string(),
        }];
        let mut store = open_store(dir.path());
        let provider = ScriptedProvider::new();

        let err = ingest_batch(&mut store, &provider, &files, IngestOptions::default())
            .await
            .unwrap_err();
        match err {
            IngestError::UnsupportedFormat { filename } => assert_eq!(filename, "data.parquet"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
