use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::types::{AiError, GenerateRequest, GenerateResponse, LlmClient, TokenUsage};

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Debug, Clone)]
enum ScriptedStep {
    Text(String),
    Failure(String),
}

/// In-memory client that replays a scripted response sequence.
///
/// Each call consumes the next step; the requests seen are recorded for
/// assertions. An exhausted script fails the call, which keeps tests honest
/// about how many completions a code path performs.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    steps: Mutex<VecDeque<ScriptedStep>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor from a list of response texts.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for response in responses {
            client.push_text(response);
        }
        client
    }

    pub fn push_text(&self, text: impl Into<String>) {
        lock_unpoisoned(&self.steps).push_back(ScriptedStep::Text(text.into()));
    }

    /// Queues a fatal gateway error for the next call.
    pub fn push_failure(&self, message: impl Into<String>) {
        lock_unpoisoned(&self.steps).push_back(ScriptedStep::Failure(message.into()));
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        lock_unpoisoned(&self.requests).clone()
    }

    pub fn calls(&self) -> usize {
        lock_unpoisoned(&self.requests).len()
    }

    pub fn remaining(&self) -> usize {
        lock_unpoisoned(&self.steps).len()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: GenerateRequest) -> Result<GenerateResponse, AiError> {
        lock_unpoisoned(&self.requests).push(request);

        let step = lock_unpoisoned(&self.steps)
            .pop_front()
            .ok_or_else(|| AiError::InvalidResponse("scripted client exhausted".to_string()))?;

        match step {
            ScriptedStep::Text(text) => Ok(GenerateResponse {
                text,
                usage: TokenUsage::default(),
            }),
            ScriptedStep::Failure(message) => Err(AiError::InvalidResponse(message)),
        }
    }
}
