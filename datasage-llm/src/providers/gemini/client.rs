//! Gemini HTTP client with rate limiting

use super::types::{ApiError, GenerateContentRequest, GenerateContentResponse};
use datasage_core::{DatasageError, DatasageResult, LlmError};
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

const PROVIDER: &str = "gemini";

/// Gemini API client with rate limiting.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: Arc<Semaphore>,
    started: Instant,
    last_request: Arc<AtomicU64>,
    min_request_interval_ms: u64,
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// # Arguments
    /// * `api_key` - Google AI API key
    /// * `requests_per_minute` - Maximum requests per minute
    pub fn new(api_key: impl Into<String>, requests_per_minute: u32) -> Self {
        let permits = (requests_per_minute as usize).max(1);
        let min_interval_ms = (60_000 / requests_per_minute.max(1) as u64).max(10);

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            rate_limiter: Arc::new(Semaphore::new(permits)),
            started: Instant::now(),
            last_request: Arc::new(AtomicU64::new(0)),
            min_request_interval_ms: min_interval_ms,
        }
    }

    /// Override the base URL (used by tests pointing at a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Call `generateContent` for the given model with automatic rate
    /// limiting.
    pub async fn generate_content(
        &self,
        model: &str,
        body: GenerateContentRequest,
    ) -> DatasageResult<GenerateContentResponse> {
        let _permit = self.rate_limiter.acquire().await.map_err(|e| {
            DatasageError::Llm(LlmError::ProviderError {
                provider: PROVIDER.to_string(),
                message: format!("Rate limiter error: {}", e),
            })
        })?;

        // Enforce minimum interval between requests
        let now_ms = self.started.elapsed().as_millis() as u64;
        let last_ms = self.last_request.load(Ordering::Relaxed);
        let elapsed = now_ms.saturating_sub(last_ms);
        if last_ms != 0 && elapsed < self.min_request_interval_ms {
            tokio::time::sleep(Duration::from_millis(self.min_request_interval_ms - elapsed))
                .await;
        }
        self.last_request.store(self.started.elapsed().as_millis() as u64, Ordering::Relaxed);

        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                DatasageError::Llm(LlmError::ProviderError {
                    provider: PROVIDER.to_string(),
                    message: format!("HTTP request failed: {}", e),
                })
            })?;

        let status = response.status();
        if status.is_success() {
            response.json().await.map_err(|e| {
                DatasageError::Llm(LlmError::InvalidResponse {
                    provider: PROVIDER.to_string(),
                    reason: format!("Failed to parse response: {}", e),
                })
            })
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let error_msg = if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                api_error.error.message
            } else {
                error_text
            };

            Err(match status {
                StatusCode::TOO_MANY_REQUESTS => DatasageError::Llm(LlmError::RateLimited {
                    provider: PROVIDER.to_string(),
                }),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    DatasageError::Llm(LlmError::InvalidApiKey {
                        provider: PROVIDER.to_string(),
                    })
                }
                _ => DatasageError::Llm(LlmError::ProviderError {
                    provider: PROVIDER.to_string(),
                    message: error_msg,
                }),
            })
        }
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::gemini::types::{Content, Part};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// One-shot HTTP stub: answers the first request with a fixed
    /// response and closes.
    async fn stub_server(status_line: &'static str, body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 16384];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{}", addr)
    }

    fn request_body() -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: "hello".to_string(),
                }],
            }],
            generation_config: None,
        }
    }

    #[tokio::test]
    async fn test_success_response_parses() {
        let base = stub_server(
            "200 OK",
            r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "SELECT 1"}]}}]}"#,
        )
        .await;
        let client = GeminiClient::new("key", 600).with_base_url(base);
        let response = client
            .generate_content("gemini-2.5-flash", request_body())
            .await
            .unwrap();
        assert_eq!(response.first_text().unwrap(), "SELECT 1");
    }

    #[tokio::test]
    async fn test_too_many_requests_maps_to_rate_limited() {
        let base = stub_server(
            "429 Too Many Requests",
            r#"{"error": {"code": 429, "message": "quota", "status": "RESOURCE_EXHAUSTED"}}"#,
        )
        .await;
        let client = GeminiClient::new("key", 600).with_base_url(base);
        let err = client
            .generate_content("gemini-2.5-flash", request_body())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DatasageError::Llm(LlmError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn test_forbidden_maps_to_invalid_api_key() {
        let base = stub_server(
            "403 Forbidden",
            r#"{"error": {"code": 403, "message": "bad key", "status": "PERMISSION_DENIED"}}"#,
        )
        .await;
        let client = GeminiClient::new("key", 600).with_base_url(base);
        let err = client
            .generate_content("gemini-2.5-flash", request_body())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DatasageError::Llm(LlmError::InvalidApiKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_server_error_carries_api_message() {
        let base = stub_server(
            "500 Internal Server Error",
            r#"{"error": {"code": 500, "message": "backend exploded", "status": "INTERNAL"}}"#,
        )
        .await;
        let client = GeminiClient::new("key", 600).with_base_url(base);
        let err = client
            .generate_content("gemini-2.5-flash", request_body())
            .await
            .unwrap_err();
        match err {
            DatasageError::Llm(LlmError::ProviderError { message, .. }) => {
                assert_eq!(message, "backend exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
