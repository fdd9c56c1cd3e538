//! Datasage Test Utilities
//!
//! Centralized test infrastructure for the Datasage workspace:
//! - A scripted `ModelProvider` with queued per-role responses
//! - CSV fixture helpers
//!
//! The scripted provider is deliberately deterministic: tests queue the
//! exact outcomes each role should return, and unqueued roles fall back
//! to benign defaults.

// Re-export core types for convenience
pub use datasage_core::{
    AgentState, DatasageError, DatasageResult, GenerationOutcome, LlmError, RestrictedColumns,
    Row,
};
pub use datasage_llm::{
    ModelProvider, RelevanceVerdict, SqlGeneration, SqlReview, TableAnalysis, TableContext,
};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// SCRIPTED MODEL PROVIDER
// ============================================================================

/// A `ModelProvider` that replays queued responses.
///
/// Every `generate_sql` call is recorded, so tests can assert on the
/// feedback threaded between attempts and on the total number of
/// generation attempts.
#[derive(Default)]
pub struct ScriptedProvider {
    outcomes: Mutex<VecDeque<GenerationOutcome>>,
    reviews: Mutex<VecDeque<SqlReview>>,
    relevance: Mutex<Option<RelevanceVerdict>>,
    relevance_error: Mutex<bool>,
    table_names: Mutex<VecDeque<String>>,
    cleanup_batches: Mutex<VecDeque<Vec<String>>>,
    fail_titles: Mutex<bool>,
    generation_inputs: Mutex<Vec<SqlGeneration>>,
    generate_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next generation outcome.
    pub fn push_outcome(&self, outcome: GenerationOutcome) -> &Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    /// Queue a generated SQL string.
    pub fn push_sql(&self, sql: &str) -> &Self {
        self.push_outcome(GenerationOutcome::Sql(sql.to_string()))
    }

    /// Queue the next review verdict.
    pub fn push_review(&self, valid: bool, reasoning: &str) -> &Self {
        self.reviews.lock().unwrap().push_back(SqlReview {
            valid,
            reasoning: reasoning.to_string(),
        });
        self
    }

    /// Fix the relevance verdict for all calls.
    pub fn set_relevance(&self, relevant: bool, reasoning: &str) -> &Self {
        *self.relevance.lock().unwrap() = Some(RelevanceVerdict {
            relevant,
            reasoning: reasoning.to_string(),
        });
        self
    }

    /// Make every relevance call fail with a provider error.
    pub fn fail_relevance(&self) -> &Self {
        *self.relevance_error.lock().unwrap() = true;
        self
    }

    /// Queue the next suggested table name. With an empty queue, the
    /// suggestion role errors so ingestion exercises its fallback path.
    pub fn push_table_name(&self, name: &str) -> &Self {
        self.table_names.lock().unwrap().push_back(name.to_string());
        self
    }

    /// Queue the next batch of cleanup statements.
    pub fn push_cleanup(&self, statements: Vec<String>) -> &Self {
        self.cleanup_batches.lock().unwrap().push_back(statements);
        self
    }

    /// Make every title call fail, exercising the truncation fallback.
    pub fn fail_titles(&self) -> &Self {
        *self.fail_titles.lock().unwrap() = true;
        self
    }

    /// Number of generation attempts made so far.
    pub fn generation_attempts(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    /// Every `SqlGeneration` input seen, in call order.
    pub fn generation_inputs(&self) -> Vec<SqlGeneration> {
        self.generation_inputs.lock().unwrap().clone()
    }

    fn provider_error(role: &str) -> DatasageError {
        DatasageError::Llm(LlmError::ProviderError {
            provider: "scripted".to_string(),
            message: format!("no scripted response for {}", role),
        })
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn generate_sql(&self, input: &SqlGeneration) -> DatasageResult<GenerationOutcome> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.generation_inputs.lock().unwrap().push(input.clone());
        let outcome = self.outcomes.lock().unwrap().pop_front();
        Ok(outcome.unwrap_or_else(|| GenerationOutcome::Sql("SELECT 1 AS one".to_string())))
    }

    async fn review_sql(&self, _sql: &str, _schema: &str) -> DatasageResult<SqlReview> {
        let review = self.reviews.lock().unwrap().pop_front();
        Ok(review.unwrap_or(SqlReview {
            valid: true,
            reasoning: "scripted approval".to_string(),
        }))
    }

    async fn check_relevance(
        &self,
        _question: &str,
        _schema: &str,
    ) -> DatasageResult<RelevanceVerdict> {
        if *self.relevance_error.lock().unwrap() {
            return Err(Self::provider_error("check_relevance"));
        }
        Ok(self.relevance.lock().unwrap().clone().unwrap_or(RelevanceVerdict {
            relevant: true,
            reasoning: "scripted relevance".to_string(),
        }))
    }

    async fn title_question(&self, question: &str) -> DatasageResult<String> {
        if *self.fail_titles.lock().unwrap() {
            return Err(Self::provider_error("title_question"));
        }
        Ok(format!("Title: {}", question.split_whitespace().next().unwrap_or("query")))
    }

    async fn suggest_table_name(
        &self,
        _filename: &str,
        _headers: &[String],
    ) -> DatasageResult<String> {
        self.table_names
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Self::provider_error("suggest_table_name"))
    }

    async fn propose_cleanup(
        &self,
        _table: &str,
        _columns: &[String],
        _sample_rows: &[Row],
    ) -> DatasageResult<Vec<String>> {
        Ok(self
            .cleanup_batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn analyze_tables(&self, contexts: &[TableContext]) -> DatasageResult<TableAnalysis> {
        Ok(TableAnalysis {
            summary: format!("scripted analysis of {} table(s)", contexts.len()),
            trends: vec![],
            anomalies: vec![],
            questions: vec![],
        })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Write a CSV file with the given header and rows into `dir`, returning
/// its path.
pub fn write_csv(dir: &Path, name: &str, header: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut content = String::from(header);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    std::fs::write(&path, content).expect("failed to write CSV fixture");
    path
}
