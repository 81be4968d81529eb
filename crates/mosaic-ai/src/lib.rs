//! LLM gateway: client contract, HTTP provider, rate limiting, and budgets.
//!
//! Experts never talk to a provider directly. Every outgoing call flows
//! through [`LlmGateway::generate`], which is the one place that sees all
//! traffic and therefore the sound choke point for rate caps and the
//! process-wide time/timeout budgets.

mod budget;
mod gateway;
mod openai;
mod rate_limit;
mod retry;
mod scripted;
mod types;

pub use budget::{BudgetSnapshot, BudgetTracker, GatewayBudgets};
pub use gateway::{GatewayOptions, LlmGateway};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use rate_limit::{ModelRateLimits, RateLimit};
pub use scripted::ScriptedClient;
pub use types::{AiError, GenerateRequest, GenerateResponse, LlmClient, TokenUsage};
