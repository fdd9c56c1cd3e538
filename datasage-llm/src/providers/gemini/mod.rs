//! Gemini provider implementation
//!
//! Implements every [`ModelProvider`](crate::ModelProvider) role over the
//! generateContent API, using JSON response mode for structured outputs.

pub mod client;
pub mod types;

pub use client::GeminiClient;

use crate::{
    prompts, ModelProvider, RelevanceVerdict, SqlGeneration, SqlReview, TableAnalysis,
    TableContext,
};
use async_trait::async_trait;
use datasage_core::{DatasageError, DatasageResult, GenerationOutcome, LlmError, Row};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use types::{Content, GenerateContentRequest, GenerationConfig, Part};

const PROVIDER: &str = "gemini";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 50;

/// Gemini-backed model provider.
pub struct GeminiProvider {
    client: GeminiClient,
    model: String,
}

impl GeminiProvider {
    /// Create a provider for a specific model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: GeminiClient::new(api_key, DEFAULT_REQUESTS_PER_MINUTE),
            model: model.into(),
        }
    }

    /// Create a provider with the default flash model.
    pub fn with_default_model(api_key: impl Into<String>) -> Self {
        Self::new(api_key, DEFAULT_MODEL)
    }

    /// Replace the underlying client (tests point it at a local stub).
    pub fn with_client(mut self, client: GeminiClient) -> Self {
        self.client = client;
        self
    }

    /// One user-turn request; JSON response mode when `json` is set.
    fn build_request(prompt: String, json: bool) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: 0.0,
                response_mime_type: json.then(|| "application/json".to_string()),
            }),
        }
    }

    async fn complete(&self, prompt: String, json: bool) -> DatasageResult<String> {
        let response = self
            .client
            .generate_content(&self.model, Self::build_request(prompt, json))
            .await?;
        response.first_text().ok_or_else(|| {
            DatasageError::Llm(LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "empty response".to_string(),
            })
        })
    }

    async fn complete_json<T: DeserializeOwned>(&self, prompt: String) -> DatasageResult<T> {
        let text = self.complete(prompt, true).await?;
        parse_json(&text)
    }
}

/// Strip accidental markdown fences from a model response.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence, then the closing fence.
    let rest = rest.strip_prefix("json").or_else(|| rest.strip_prefix("sql")).unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_json<T: DeserializeOwned>(text: &str) -> DatasageResult<T> {
    serde_json::from_str(strip_fences(text)).map_err(|e| {
        DatasageError::Llm(LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: format!("malformed JSON payload: {}", e),
        })
    })
}

/// Wire shape of a generation answer: either SQL or the missing-columns
/// signal.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerationPayload {
    Missing {
        #[allow(dead_code)]
        error: bool,
        #[serde(alias = "missingColumns")]
        missing_columns: Vec<String>,
    },
    Sql {
        sql: String,
    },
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn generate_sql(&self, input: &SqlGeneration) -> DatasageResult<GenerationOutcome> {
        let payload: GenerationPayload =
            self.complete_json(prompts::sql_generation(input)).await?;
        Ok(match payload {
            GenerationPayload::Sql { sql } => GenerationOutcome::Sql(sql.trim().to_string()),
            GenerationPayload::Missing {
                missing_columns, ..
            } => GenerationOutcome::MissingColumns(missing_columns),
        })
    }

    async fn review_sql(&self, sql: &str, schema: &str) -> DatasageResult<SqlReview> {
        self.complete_json(prompts::sql_review(sql, schema)).await
    }

    async fn check_relevance(
        &self,
        question: &str,
        schema: &str,
    ) -> DatasageResult<RelevanceVerdict> {
        self.complete_json(prompts::relevance_check(question, schema))
            .await
    }

    async fn title_question(&self, question: &str) -> DatasageResult<String> {
        let text = self.complete(prompts::title(question), false).await?;
        Ok(strip_fences(&text).replace(['"', '\n'], "").trim().to_string())
    }

    async fn suggest_table_name(
        &self,
        filename: &str,
        headers: &[String],
    ) -> DatasageResult<String> {
        let text = self
            .complete(prompts::table_name(filename, headers), false)
            .await?;
        Ok(strip_fences(&text).replace('\n', "").trim().to_string())
    }

    async fn propose_cleanup(
        &self,
        table: &str,
        columns: &[String],
        sample_rows: &[Row],
    ) -> DatasageResult<Vec<String>> {
        let sample = serde_json::to_string(sample_rows).unwrap_or_else(|_| "[]".to_string());
        let text = self
            .complete(prompts::cleanup(table, columns, &sample), false)
            .await?;
        Ok(strip_fences(&text)
            .split(';')
            .map(str::trim)
            .filter(|stmt| !stmt.is_empty())
            .map(|stmt| stmt.to_string())
            .collect())
    }

    async fn analyze_tables(&self, contexts: &[TableContext]) -> DatasageResult<TableAnalysis> {
        self.complete_json(prompts::table_analysis(contexts)).await
    }
}

// =============================================================================
// TESTS
// =============================================================================
