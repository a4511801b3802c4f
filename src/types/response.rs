//! Summary result types

use serde::{Deserialize, Serialize};

/// Token usage statistics
///
/// All zeros when the summary did not come from a token-metered path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Raw output of one summarization engine, before the pipeline adds
/// request-level accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub summary: String,
    pub usage: Usage,
    /// Identifier of the engine that produced the text.
    pub model: String,
}

/// Output of the summarization pipeline.
///
/// Serializes to the public response body:
/// `{summary, usage, model, latency_ms, fallback_used, cached}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    pub usage: Usage,
    pub model: String,
    /// Wall-clock time of the whole pipeline invocation.
    pub latency_ms: u64,
    #[serde(rename = "fallback_used")]
    pub used_fallback: bool,
    #[serde(rename = "cached")]
    pub served_from_cache: bool,
}
