//! The persisted dataset store.
//!
//! One SQLite file per dataset. Ingestion and append operations run
//! sequentially against it; question answering never touches it directly
//! (the sandbox session works on a copy).

use crate::rows::quote_ident;
use datasage_core::SandboxError;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Handle on a persisted dataset file.
pub struct DatasetStore {
    conn: Connection,
    path: PathBuf,
}

impl DatasetStore {
    /// Open the store at `path`, creating the file if it does not exist.
    pub fn open(path: &Path) -> Result<Self, SandboxError> {
        let conn = Connection::open(path).map_err(|e| SandboxError::OpenFailed {
            reason: e.to_string(),
        })?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Irreversibly drop a table from the persisted store.
    pub fn drop_table(&self, table: &str) -> Result<(), SandboxError> {
        let sql = format!("DROP TABLE IF EXISTS {}", quote_ident(table));
        self.conn
            .execute(&sql, [])
            .map_err(|e| SandboxError::QueryFailed {
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

impl std::fmt::Debug for DatasetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetStore")
            .field("path", &self.path)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.sqlite");
        let store = DatasetStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path);
    }

    #[test]
    fn test_drop_table_removes_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.sqlite");
        let store = DatasetStore::open(&path).unwrap();
        store
            .conn()
            .execute_batch("CREATE TABLE gone (a TEXT); INSERT INTO gone VALUES ('x');")
            .unwrap();

        store.drop_table("gone").unwrap();

        let count: i64 = store
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='gone'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_drop_table_missing_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::open(&dir.path().join("data.sqlite")).unwrap();
        store.drop_table("never_existed").unwrap();
    }
}
