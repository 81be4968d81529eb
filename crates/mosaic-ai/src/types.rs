use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A single completion request routed by model id.
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub seed: u64,
    /// Opaque provider options merged verbatim into the request body
    /// (e.g. a thinking budget).
    #[serde(default)]
    pub extras: serde_json::Map<String, Value>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: 1.0,
            seed: 0,
            extras: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
/// Token accounting reported by the provider.
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Raw assistant text plus usage for one completed call.
pub struct GenerateResponse {
    pub text: String,
    #[serde(default)]
    pub usage: TokenUsage,
}

#[derive(Debug, Error)]
/// Fatal gateway-surface errors. Transient provider failures are retried
/// inside the client and never reach callers.
pub enum AiError {
    #[error("missing API key")]
    MissingApiKey,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("no client registered for model '{0}'")]
    UnknownModel(String),
    #[error("request timed out after {0}ms")]
    RequestTimeout(u64),
    #[error("gateway budget exhausted: {reason}")]
    BudgetExhausted { reason: &'static str },
}

impl AiError {
    /// True when the expert loop should terminate instead of recording a
    /// failed attempt and continuing.
    pub fn is_budget_exhausted(&self) -> bool {
        matches!(self, AiError::BudgetExhausted { .. })
    }
}

#[async_trait]
/// Trait contract for one model provider.
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: GenerateRequest) -> Result<GenerateResponse, AiError>;
}
