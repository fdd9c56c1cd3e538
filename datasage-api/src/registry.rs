//! In-memory dataset registry.
//!
//! Maps the opaque dataset identifier handed to callers onto the
//! persisted store path. Durable upload logs are an external
//! collaborator's responsibility; this registry only serves the running
//! process.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use uuid::Uuid;

/// One registered dataset.
#[derive(Debug, Clone)]
pub struct DatasetEntry {
    pub path: PathBuf,
    pub original_name: String,
    pub created_at: DateTime<Utc>,
}

/// Thread-safe id -> dataset map.
#[derive(Debug, Default)]
pub struct DatasetRegistry {
    inner: RwLock<HashMap<Uuid, DatasetEntry>>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset store and return its opaque identifier.
    pub fn register(&self, path: &Path, original_name: &str) -> Uuid {
        let id = Uuid::now_v7();
        self.inner.write().unwrap().insert(
            id,
            DatasetEntry {
                path: path.to_path_buf(),
                original_name: original_name.to_string(),
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn get(&self, id: Uuid) -> Option<DatasetEntry> {
        self.inner.read().unwrap().get(&id).cloned()
    }
}

// =============================================================================
// TESTS
// =============================================================================
