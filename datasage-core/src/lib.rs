//! Datasage Core - Pipeline Data Types
//!
//! Pure data structures for the question-answering pipeline. All other
//! crates depend on this. This crate contains ONLY data types and pure
//! helpers - no I/O, no model calls.

pub mod columns;
pub mod error;
pub mod log;
pub mod outcome;
pub mod querylog;
pub mod snapshot;
pub mod state;

pub use columns::RestrictedColumns;
pub use error::{DatasageError, DatasageResult, IngestError, LlmError, SandboxError};
pub use log::{Milestone, MilestoneKind, PipelineLog};
pub use outcome::GenerationOutcome;
pub use querylog::QueryRecord;
pub use snapshot::{ColumnType, DatabaseState, TableInfo, TableSnapshot};
pub use state::{AgentState, Row};

/// Maximum number of generation attempts per question. The circuit breaker
/// against infinite model-retry loops and runaway cost.
pub const MAX_ITERATIONS: u32 = 3;
