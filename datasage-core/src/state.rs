//! Agent state threaded through the generate/validate/execute machine.
//!
//! `AgentState` is an immutable value: every transition produces a new
//! state, so intermediate states stay inspectable for logging and audit.
//! The loop driver owns the single mutable binding holding "current state".

use crate::outcome::GenerationOutcome;
use serde::{Deserialize, Serialize};

/// One result row, as returned by the sandbox. Keys are column names in
/// projection order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// The unit of orchestration for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentState {
    /// The natural-language question being answered.
    pub question: String,
    /// DDL-like schema text the generator works against.
    pub schema: String,
    /// Feedback carried into the next generation attempt, if any.
    pub feedback: Option<String>,
    /// The current candidate SQL (or the last attempted one).
    pub sql: Option<String>,
    /// Validator verdict for the current candidate; unset before the first
    /// validation.
    pub valid: Option<bool>,
    /// Result rows once execution succeeded.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Vec<Object>>))]
    pub result: Option<Vec<Row>>,
    /// Number of generation attempts so far. Only ever increases.
    pub iterations: u32,
    /// Caller-pinned `table:column` identifiers that must appear in the
    /// final projection. Empty means the generator may choose freely.
    pub restricted_columns: Vec<String>,
}

impl AgentState {
    /// Initial state for a fresh question.
    pub fn new(
        question: impl Into<String>,
        schema: impl Into<String>,
        restricted_columns: Vec<String>,
    ) -> Self {
        Self {
            question: question.into(),
            schema: schema.into(),
            feedback: None,
            sql: None,
            valid: None,
            result: None,
            iterations: 0,
            restricted_columns,
        }
    }

    /// Entry into the Generate state: the attempt counter ticks here and
    /// nowhere else.
    pub fn enter_generation(&self) -> Self {
        Self {
            iterations: self.iterations + 1,
            ..self.clone()
        }
    }

    /// Record the generator's output. A `MissingColumns` outcome leaves
    /// `sql` at its serialized signal form so the caller still sees what
    /// the generator produced.
    pub fn with_outcome(&self, outcome: &GenerationOutcome) -> Self {
        Self {
            sql: Some(outcome.as_sql_field()),
            valid: None,
            ..self.clone()
        }
    }

    /// Validator (or deterministic gate) rejected the candidate.
    pub fn rejected(&self, feedback: impl Into<String>) -> Self {
        Self {
            valid: Some(false),
            feedback: Some(feedback.into()),
            ..self.clone()
        }
    }

    /// Validator accepted the candidate.
    pub fn accepted(&self, reasoning: impl Into<String>) -> Self {
        Self {
            valid: Some(true),
            feedback: Some(reasoning.into()),
            ..self.clone()
        }
    }

    /// Execution succeeded; terminal success.
    pub fn with_result(&self, rows: Vec<Row>) -> Self {
        Self {
            result: Some(rows),
            ..self.clone()
        }
    }

    /// Execution raised a runtime error: validity is forced back to false
    /// and the runtime message becomes the next attempt's feedback.
    pub fn execution_failed(&self, feedback: impl Into<String>) -> Self {
        Self {
            valid: Some(false),
            feedback: Some(feedback.into()),
            result: None,
            ..self.clone()
        }
    }

    /// Whether the current candidate passed validation.
    pub fn is_valid(&self) -> bool {
        self.valid == Some(true)
    }
}

// =============================================================================
// TESTS
// =============================================================================
