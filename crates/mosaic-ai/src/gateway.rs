use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::{Duration, Instant};

use crate::budget::{BudgetSnapshot, BudgetTracker, GatewayBudgets};
use crate::rate_limit::{ModelRateLimits, RateLimiterSet};
use crate::types::{AiError, GenerateRequest, GenerateResponse, LlmClient};

#[derive(Debug, Clone)]
/// Gateway-level policy: process-wide budgets, per-model rate caps, and the
/// per-call timeout ceiling.
pub struct GatewayOptions {
    pub budgets: GatewayBudgets,
    pub rate_limits: ModelRateLimits,
    pub call_timeout_ms: u64,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            budgets: GatewayBudgets::default(),
            rate_limits: ModelRateLimits::default(),
            call_timeout_ms: 180_000,
        }
    }
}

/// The single call surface experts use.
///
/// Every outgoing completion passes rate limiting, a fail-fast budget check,
/// and a per-call timeout bounded by the remaining time budget. Budgets are
/// debited after every call, so exhaustion observed here is authoritative
/// even though expert-side snapshot reads are racy.
pub struct LlmGateway {
    clients: HashMap<String, Arc<dyn LlmClient>>,
    limiter: RateLimiterSet,
    budgets: BudgetTracker,
    call_timeout_ms: u64,
}

impl LlmGateway {
    pub fn new(options: GatewayOptions) -> Self {
        Self {
            clients: HashMap::new(),
            limiter: RateLimiterSet::new(options.rate_limits),
            budgets: BudgetTracker::new(options.budgets),
            call_timeout_ms: options.call_timeout_ms.max(1),
        }
    }

    /// Routes `model` to `client`. Later registrations replace earlier ones.
    pub fn register_client(&mut self, model: impl Into<String>, client: Arc<dyn LlmClient>) {
        self.clients.insert(model.into(), client);
    }

    /// Racy read of the remaining budgets, for expert self-audit.
    pub fn budget_snapshot(&self) -> BudgetSnapshot {
        self.budgets.snapshot()
    }

    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, AiError> {
        if let Some(reason) = self.budgets.exhausted() {
            return Err(AiError::BudgetExhausted { reason });
        }
        let client = self
            .clients
            .get(&request.model)
            .cloned()
            .ok_or_else(|| AiError::UnknownModel(request.model.clone()))?;

        self.limiter.acquire(&request.model).await;

        // The limiter wait may have consumed the rest of the time budget.
        let snapshot = self.budgets.snapshot();
        if let Some(reason) = snapshot.exhausted() {
            return Err(AiError::BudgetExhausted { reason });
        }
        let timeout_ms = self.call_timeout_ms.min(snapshot.remaining_time_ms).max(1);

        let started = Instant::now();
        let outcome = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            client.complete(request),
        )
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.budgets.charge_elapsed(elapsed_ms);

        match outcome {
            Ok(result) => result,
            Err(_) => {
                self.budgets.charge_timeout();
                tracing::warn!(timeout_ms, "gateway call cut off at deadline");
                Err(AiError::RequestTimeout(timeout_ms))
            }
        }
    }
}
