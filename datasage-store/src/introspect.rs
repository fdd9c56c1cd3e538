//! Schema introspection.
//!
//! Derives table/column definitions and row samples directly from a
//! store, for callers that did not supply schema text.

use crate::rows::{query_rows, quote_ident};
use datasage_core::{DatabaseState, Row, SandboxError, TableSnapshot};
use rusqlite::Connection;

/// Names of user tables, excluding SQLite internals.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>, SandboxError> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
        .map_err(query_failed)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(query_failed)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(query_failed)?;
    Ok(names)
}

/// Schema text: every table's creation statement, concatenated.
pub fn schema_text(conn: &Connection) -> Result<String, SandboxError> {
    let mut stmt = conn
        .prepare("SELECT sql FROM sqlite_master WHERE type='table' AND sql IS NOT NULL AND name NOT LIKE 'sqlite_%' ORDER BY name")
        .map_err(query_failed)?;
    let statements = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(query_failed)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(query_failed)?;
    Ok(statements.join(";\n\n"))
}

/// Column names of one table, in declaration order.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, SandboxError> {
    let sql = format!("PRAGMA table_info({})", quote_ident(table));
    let mut stmt = conn.prepare(&sql).map_err(query_failed)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(query_failed)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(query_failed)?;
    Ok(names)
}

/// Up to `limit` rows of one table.
pub fn sample_rows(conn: &Connection, table: &str, limit: u32) -> Result<Vec<Row>, SandboxError> {
    let sql = format!("SELECT * FROM {} LIMIT {}", quote_ident(table), limit);
    query_rows(conn, &sql).map_err(query_failed)
}

/// Per-table snapshot: one sample row plus the total count. The per-table
/// reads are independent read-only queries; they run sequentially over
/// this connection.
pub fn database_state(conn: &Connection) -> Result<DatabaseState, SandboxError> {
    let mut state = DatabaseState::new();
    for table in list_tables(conn)? {
        let rows = sample_rows(conn, &table, 1)?;
        let total: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", quote_ident(&table)),
                [],
                |row| row.get(0),
            )
            .map_err(query_failed)?;
        state.insert(table, TableSnapshot { rows, total });
    }
    Ok(state)
}

fn query_failed(e: rusqlite::Error) -> SandboxError {
    SandboxError::QueryFailed {
        reason: e.to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
