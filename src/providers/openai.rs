//! OpenAI Responses API client.
//!
//! See: <https://platform.openai.com/docs/api-reference/responses>

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::prompt;
use super::traits::SummaryProvider;
use crate::types::{Generation, SummaryRequest, Usage};
use crate::{FailureClass, PrecisError, Result};

/// Default base URL for the OpenAI API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-5-nano";
/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(4000);

/// Responses shorter than this (after trimming) are rejected.
const MIN_SUMMARY_CHARS: usize = 10;
const PROBE_MAX_OUTPUT_TOKENS: u32 = 16;

/// Client for the OpenAI Responses API.
///
/// Performs one remote call per [`generate`](SummaryProvider::generate);
/// wrap it in a [`RetryingProvider`](super::RetryingProvider) for retries.
#[derive(Clone)]
pub struct OpenAiProvider {
    api_key: String,
    http: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiProvider {
    /// Create a provider against the public API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a provider with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the model (default `gpt-5-nano`).
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the per-call timeout (default 4s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn call(&self, body: &ResponsesRequest<'_>) -> Result<ResponsesReply> {
        let url = format!("{}/responses", self.base_url);
        let fut = async {
            let response = self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .timeout(self.timeout)
                .json(body)
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;

            let response = check_status(response).await?;

            let raw = response
                .text()
                .await
                .map_err(|e| self.transport_error(e))?;
            serde_json::from_str::<ResponsesReply>(&raw)
                .map_err(|e| PrecisError::InvalidResponse(format!("undecodable body: {e}")))
        };
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| PrecisError::Timeout(self.timeout))?
    }

    fn transport_error(&self, e: reqwest::Error) -> PrecisError {
        if e.is_timeout() {
            PrecisError::Timeout(self.timeout)
        } else {
            PrecisError::Http(e.to_string())
        }
    }

    fn log_failure(&self, err: &PrecisError, elapsed: Duration) {
        let class = err.class().map_or("unclassified", FailureClass::as_str);
        let latency_ms = elapsed.as_millis() as u64;
        match err.class() {
            Some(FailureClass::RateLimited) => warn!(
                provider = "openai",
                model = %self.model,
                error_class = class,
                latency_ms,
                error = %err,
                "OpenAI rate limit hit"
            ),
            _ => error!(
                provider = "openai",
                model = %self.model,
                error_class = class,
                latency_ms,
                error = %err,
                "OpenAI call failed"
            ),
        }
    }
}

/// Map a non-success status to an error, passing successful responses through.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        401 | 403 => Err(PrecisError::AuthenticationFailed),
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            Err(PrecisError::RateLimited { retry_after })
        }
        code => {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("OpenAI API error: {status}"));
            Err(PrecisError::Api {
                status: code,
                message,
            })
        }
    }
}

#[async_trait]
impl SummaryProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &SummaryRequest) -> Result<Generation> {
        let instructions = prompt::system_prompt(request.language, request.tone);
        let body = ResponsesRequest {
            model: &self.model,
            instructions: &instructions,
            input: &request.text,
            max_output_tokens: request.max_output_tokens,
        };

        info!(
            provider = "openai",
            model = %self.model,
            text_length = request.text.chars().count(),
            max_output_tokens = request.max_output_tokens,
            language = %request.language,
            tone = %request.tone,
            "calling OpenAI"
        );

        let start = Instant::now();
        let result = self.call(&body).await.and_then(|mut reply| {
            let usage = reply.usage.take().map(Usage::from).unwrap_or_default();
            let summary = reply.into_text().trim().to_string();
            if summary.chars().count() < MIN_SUMMARY_CHARS {
                return Err(PrecisError::InvalidResponse(
                    "empty or too short summary".to_string(),
                ));
            }
            Ok(Generation {
                summary,
                usage,
                model: self.model.clone(),
            })
        });

        match &result {
            Ok(generation) => info!(
                provider = "openai",
                model = %self.model,
                prompt_tokens = generation.usage.prompt_tokens,
                completion_tokens = generation.usage.completion_tokens,
                summary_length = generation.summary.chars().count(),
                latency_ms = start.elapsed().as_millis() as u64,
                "OpenAI summary generated"
            ),
            Err(e) => self.log_failure(e, start.elapsed()),
        }
        result
    }

    async fn probe(&self) -> Result<()> {
        let body = ResponsesRequest {
            model: &self.model,
            instructions: prompt::PROBE_INSTRUCTIONS,
            input: prompt::PROBE_INPUT,
            max_output_tokens: PROBE_MAX_OUTPUT_TOKENS,
        };
        self.call(&body)
            .await
            .map(|_| ())
            .inspect_err(|e| warn!(provider = "openai", error = %e, "OpenAI probe failed"))
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: &'a str,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    usage: Option<ReplyUsage>,
}

impl ResponsesReply {
    /// Top-level `output_text`, else every `output_text` content part joined.
    fn into_text(self) -> String {
        if let Some(text) = self.output_text.filter(|t| !t.is_empty()) {
            return text;
        }
        self.output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text)
            .collect()
    }
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ReplyUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl From<ReplyUsage> for Usage {
    fn from(u: ReplyUsage) -> Self {
        Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_prefers_output_text() {
        let reply: ResponsesReply = serde_json::from_str(
            r#"{"output_text":"top level","output":[{"content":[{"type":"output_text","text":"nested"}]}]}"#,
        )
        .unwrap();
        assert_eq!(reply.into_text(), "top level");
    }

    #[test]
    fn reply_concatenates_output_parts() {
        let reply: ResponsesReply = serde_json::from_str(
            r#"{"output":[
                {"type":"reasoning"},
                {"type":"message","content":[
                    {"type":"output_text","text":"Hello "},
                    {"type":"refusal","refusal":"no"},
                    {"type":"output_text","text":"world"}
                ]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(reply.into_text(), "Hello world");
    }

    #[test]
    fn reply_without_text_is_empty() {
        let reply: ResponsesReply = serde_json::from_str("{}").unwrap();
        assert!(reply.usage.is_none());
        assert_eq!(reply.into_text(), "");
    }

    #[test]
    fn usage_maps_fields() {
        let usage: ReplyUsage =
            serde_json::from_str(r#"{"input_tokens":5,"output_tokens":7,"total_tokens":12}"#)
                .unwrap();
        assert_eq!(Usage::from(usage), Usage::new(5, 7));
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let provider = OpenAiProvider::with_base_url("sk-test", "http://localhost:1234/");
        assert_eq!(provider.base_url, "http://localhost:1234");
        assert_eq!(SummaryProvider::model(&provider), DEFAULT_MODEL);
    }
}
