//! Table metadata and store snapshots.

use crate::state::Row;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inferred column type for ingested tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Every non-empty value in the column parses as a number.
    Numeric,
    /// Anything else.
    Text,
}

impl ColumnType {
    /// The SQLite storage type used for CREATE TABLE.
    pub fn as_sql_type(&self) -> &'static str {
        match self {
            Self::Numeric => "REAL",
            Self::Text => "TEXT",
        }
    }
}

/// One ingested table: name, ordered columns with inferred types, and the
/// number of rows loaded from the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TableInfo {
    pub name: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<Object>))]
    pub columns: Vec<(String, ColumnType)>,
    pub row_count: usize,
}

/// Per-table snapshot returned to callers: one sample row plus the total
/// row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TableSnapshot {
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<Object>))]
    pub rows: Vec<Row>,
    pub total: i64,
}

/// Snapshot of every table in a store, keyed by table name. BTreeMap keeps
/// the serialized order deterministic.
pub type DatabaseState = BTreeMap<String, TableSnapshot>;

// =============================================================================
// TESTS
// =============================================================================
