//! The orchestrator: one sequential run of the retry state machine per
//! question.
//!
//! Validation is a cheap static-plus-model check that catches most
//! defects before an execution; execution failures that slip past it are
//! fed back for a bounded number of repair attempts. Terminal failure
//! still returns the last generated SQL and feedback - the caller always
//! receives a best-effort answer, never an exception.

use crate::machine::{after_execution, after_validation, AfterExecution, AfterValidation};
use datasage_core::{
    AgentState, DatasageResult, GenerationOutcome, PipelineLog, RestrictedColumns,
};
use datasage_llm::{ModelProvider, SqlGeneration};
use datasage_store::SandboxSession;
use std::sync::Arc;

/// One question to answer.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub question: String,
    pub schema: String,
    pub restricted_columns: RestrictedColumns,
}

/// Final state plus the ordered milestone log of the run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub state: AgentState,
    pub log: PipelineLog,
}

/// Drives generate -> validate -> execute until terminal success or
/// iteration exhaustion.
pub struct Orchestrator {
    provider: Arc<dyn ModelProvider>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider }
    }

    /// Run the machine for one question against one sandbox session.
    ///
    /// Errors only on provider transport failures; model rejections and
    /// runtime SQL errors are consumed by the retry loop.
    pub async fn run(
        &self,
        session: &SandboxSession,
        request: &AgentRequest,
    ) -> DatasageResult<RunOutcome> {
        let mut log = PipelineLog::new();
        log.action("starting question workflow");

        // Soft gate: a false negative here would block a legitimate
        // question, so a failed or errored check only warns.
        match self
            .provider
            .check_relevance(&request.question, &request.schema)
            .await
        {
            Ok(verdict) if !verdict.relevant => {
                tracing::warn!(
                    reasoning = %verdict.reasoning,
                    "relevance check failed; proceeding anyway"
                );
                log.action("relevance check failed; proceeding anyway");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "relevance check errored; assuming relevant");
            }
        }

        let mut state = AgentState::new(
            &request.question,
            &request.schema,
            request.restricted_columns.entries().to_vec(),
        );

        loop {
            // --- Generate ---
            state = state.enter_generation();
            log.state("generate_sql");
            log.action(format!(
                "generating candidate SQL (attempt {})",
                state.iterations
            ));
            let outcome = self
                .provider
                .generate_sql(&SqlGeneration {
                    question: state.question.clone(),
                    schema: state.schema.clone(),
                    feedback: state.feedback.clone().unwrap_or_default(),
                    allowed_columns: request.restricted_columns.prompt_block(),
                })
                .await?;
            log.tool_output(outcome.as_sql_field());
            state = state.with_outcome(&outcome);

            // --- Validate ---
            log.state("validate_sql");
            state = self.validate(&outcome, &state, request, &mut log).await?;

            match after_validation(&state) {
                AfterValidation::Retry => continue,
                AfterValidation::GiveUp => {
                    log.action("iteration cap reached; returning last attempt");
                    return Ok(RunOutcome { state, log });
                }
                AfterValidation::Execute => {}
            }

            // --- Execute ---
            log.state("execute_sql");
            let sql = state.sql.clone().unwrap_or_default();
            match session.query(&sql) {
                Ok(rows) => {
                    log.tool_output(format!("execution returned {} row(s)", rows.len()));
                    return Ok(RunOutcome {
                        state: state.with_result(rows),
                        log,
                    });
                }
                Err(e) => {
                    let feedback = format!("Runtime Error: {}. Please fix the SQL.", e);
                    log.tool_output(feedback.as_str());
                    state = state.execution_failed(feedback);
                    match after_execution(&state) {
                        AfterExecution::Retry => continue,
                        AfterExecution::GiveUp => {
                            log.action("iteration cap reached; returning last attempt");
                            return Ok(RunOutcome { state, log });
                        }
                    }
                }
            }
        }
    }

    /// The Validate state. Deterministic gates run before the model
    /// review: a missing-columns signal and a projection that dropped a
    /// pinned column are both rejected without spending a model call.
    async fn validate(
        &self,
        outcome: &GenerationOutcome,
        state: &AgentState,
        request: &AgentRequest,
        log: &mut PipelineLog,
    ) -> DatasageResult<AgentState> {
        let sql = match outcome {
            GenerationOutcome::MissingColumns(columns) => {
                let feedback = format!(
                    "Cannot answer from this schema: missing column(s) {}",
                    columns.join(", ")
                );
                log.tool_output(feedback.as_str());
                return Ok(state.rejected(feedback));
            }
            GenerationOutcome::Sql(sql) => sql,
        };

        let missing = request.restricted_columns.missing_from_projection(sql);
        if !missing.is_empty() {
            let feedback = format!(
                "The SELECT clause must include the required column(s): {}. \
                 Rewrite the query so each one appears in the projection list.",
                missing.join(", ")
            );
            log.tool_output(feedback.as_str());
            return Ok(state.rejected(feedback));
        }

        let review = self.provider.review_sql(sql, &state.schema).await?;
        log.tool_output(format!(
            "valid={}; {}",
            review.valid, review.reasoning
        ));
        Ok(if review.valid {
            state.accepted(review.reasoning)
        } else {
            state.rejected(review.reasoning)
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
