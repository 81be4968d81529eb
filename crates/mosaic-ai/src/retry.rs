use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub const BASE_BACKOFF_MS: u64 = 250;

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(1);
static JITTER_COUNTER: AtomicU64 = AtomicU64::new(1);

pub fn should_retry_status(status: u16) -> bool {
    status == 408 || status == 409 || status == 425 || status == 429 || status >= 500
}

/// Exponential backoff for the given attempt, optionally jittered into
/// [50%, 100%] of the deterministic value.
pub fn backoff_delay_ms(attempt: usize, jitter_enabled: bool) -> u64 {
    let shift = attempt.min(6);
    let base = BASE_BACKOFF_MS.saturating_mul(1_u64 << shift);
    if !jitter_enabled || base <= 1 {
        return base;
    }

    let floor = base / 2;
    let width = base.saturating_sub(floor);
    let counter = JITTER_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mixed = counter
        .wrapping_mul(0xD1B5_4A32_D192_ED03)
        .rotate_left(23)
        ^ 0x8CB9_2BA7_2F3D_8DD7;
    let jitter = if width == 0 { 0 } else { mixed % (width + 1) };
    floor.saturating_add(jitter)
}

/// Reads a `retry-after` header as milliseconds, accepting either a seconds
/// count or an HTTP-date.
pub fn parse_retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    let raw = headers.get("retry-after")?.to_str().ok()?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(seconds.saturating_mul(1000));
    }

    let retry_at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    let delay_ms = retry_at.signed_duration_since(Utc::now()).num_milliseconds();
    if delay_ms <= 0 {
        return Some(0);
    }
    u64::try_from(delay_ms).ok()
}

/// Delay before the next attempt: backoff, floored by any provider
/// `retry-after` hint.
pub fn retry_delay_ms(attempt: usize, jitter_enabled: bool, retry_after_ms: Option<u64>) -> u64 {
    let backoff_ms = backoff_delay_ms(attempt, jitter_enabled);
    match retry_after_ms {
        Some(floor_ms) => backoff_ms.max(floor_ms),
        None => backoff_ms,
    }
}

/// A retry budget of zero disables the wall-clock cap.
pub fn retry_budget_allows_delay(elapsed_ms: u64, delay_ms: u64, retry_budget_ms: u64) -> bool {
    if retry_budget_ms == 0 {
        return true;
    }
    elapsed_ms.saturating_add(delay_ms) <= retry_budget_ms
}

pub fn is_retryable_http_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request() || error.is_body()
}

pub fn new_request_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let count = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("mosaic-{millis}-{count}")
}
