//! The disposable query-execution sandbox.
//!
//! A session owns an exclusive working copy of a dataset file (or a pure
//! in-memory store when no file is supplied), so query execution -
//! including any accidental mutation - never corrupts the system of
//! record. Destructive statements are deliberately NOT filtered: the
//! working copy is the safety boundary.
//!
//! Cleanup is structural: the temporary copy is deleted in `Drop`, which
//! runs on every exit path of the owning request. Deletion failure is
//! logged, never escalated.

use crate::rows::query_rows;
use datasage_core::{Row, SandboxError};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// An isolated, disposable copy of a dataset for one request.
pub struct SandboxSession {
    conn: Connection,
    temp_copy: Option<PathBuf>,
}

impl SandboxSession {
    /// Materialize a session: a working copy of `source` when given, a
    /// transient in-memory store otherwise.
    pub fn open(source: Option<&Path>) -> Result<Self, SandboxError> {
        match source {
            Some(path) => Self::from_file(path),
            None => Self::in_memory(),
        }
    }

    /// Transient in-memory session.
    pub fn in_memory() -> Result<Self, SandboxError> {
        let conn = Connection::open_in_memory().map_err(|e| SandboxError::OpenFailed {
            reason: e.to_string(),
        })?;
        Ok(Self {
            conn,
            temp_copy: None,
        })
    }

    /// Copy `source` to a uniquely-named sibling file and open the copy.
    ///
    /// A missing source fails fast before any copy is attempted; both
    /// failure modes are fatal for the request.
    pub fn from_file(source: &Path) -> Result<Self, SandboxError> {
        if !source.exists() {
            return Err(SandboxError::SourceMissing {
                path: source.to_path_buf(),
            });
        }

        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dataset.sqlite");
        let dir = source.parent().unwrap_or_else(|| Path::new("."));
        let temp_copy = dir.join(format!("sandbox-{}-{}", Uuid::now_v7(), file_name));

        std::fs::copy(source, &temp_copy).map_err(|e| SandboxError::CopyFailed {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;

        match Connection::open(&temp_copy) {
            Ok(conn) => Ok(Self {
                conn,
                temp_copy: Some(temp_copy),
            }),
            Err(e) => {
                remove_working_copy(&temp_copy);
                Err(SandboxError::OpenFailed {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Run a statement and return its rows verbatim.
    pub fn query(&self, sql: &str) -> Result<Vec<Row>, SandboxError> {
        query_rows(&self.conn, sql).map_err(|e| SandboxError::QueryFailed {
            reason: e.to_string(),
        })
    }

    /// Run one or more statements for their side effects.
    pub fn execute(&self, sql: &str) -> Result<(), SandboxError> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| SandboxError::QueryFailed {
                reason: e.to_string(),
            })
    }

    /// The raw connection, for introspection helpers.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Path of the temporary working copy, if this session has one.
    pub fn working_copy(&self) -> Option<&Path> {
        self.temp_copy.as_deref()
    }

    /// Explicitly end the session. Equivalent to dropping it; cleanup is
    /// guaranteed either way.
    pub fn close(self) {}
}

impl Drop for SandboxSession {
    fn drop(&mut self) {
        if let Some(path) = self.temp_copy.take() {
            remove_working_copy(&path);
        }
    }
}

fn remove_working_copy(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to delete sandbox working copy"
        );
    }
}

impl std::fmt::Debug for SandboxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxSession")
            .field("temp_copy", &self.temp_copy)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
