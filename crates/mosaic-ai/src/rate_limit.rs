use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Token-bucket parameters: up to `burst` calls at once, refilled at
/// `per_second`. A refill rate of zero disables the cap.
pub struct RateLimit {
    pub burst: u32,
    pub per_second: f64,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            burst: 2,
            per_second: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Per-model request-rate caps, shared across all experts using a model.
pub struct ModelRateLimits {
    #[serde(default)]
    pub default: RateLimit,
    #[serde(default)]
    pub per_model: HashMap<String, RateLimit>,
}

impl ModelRateLimits {
    fn for_model(&self, model: &str) -> RateLimit {
        self.per_model.get(model).copied().unwrap_or(self.default)
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Debug)]
/// One bucket per model id. `acquire` sleeps outside the map lock so a
/// throttled model never stalls acquisition for other models.
pub(crate) struct RateLimiterSet {
    limits: ModelRateLimits,
    buckets: tokio::sync::Mutex<HashMap<String, Bucket>>,
}

impl RateLimiterSet {
    pub(crate) fn new(limits: ModelRateLimits) -> Self {
        Self {
            limits,
            buckets: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    pub(crate) async fn acquire(&self, model: &str) {
        let limit = self.limits.for_model(model);
        if limit.per_second <= 0.0 {
            return;
        }

        loop {
            let wait = {
                let mut buckets = self.buckets.lock().await;
                let bucket = buckets.entry(model.to_string()).or_insert_with(|| Bucket {
                    tokens: limit.burst as f64,
                    last_refill: Instant::now(),
                });
                let now = Instant::now();
                let refilled = bucket.tokens
                    + now.duration_since(bucket.last_refill).as_secs_f64() * limit.per_second;
                bucket.tokens = refilled.min(limit.burst as f64);
                bucket.last_refill = now;

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    None
                } else {
                    Some(Duration::from_secs_f64(
                        (1.0 - bucket.tokens) / limit.per_second,
                    ))
                }
            };

            match wait {
                None => return,
                Some(delay) => tokio::time::sleep(delay).await,
            }
        }
    }
}
