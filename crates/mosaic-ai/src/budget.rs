use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Process-wide spending limits for one solve.
pub struct GatewayBudgets {
    pub total_time_ms: u64,
    pub max_timeouts: u32,
}

impl Default for GatewayBudgets {
    fn default() -> Self {
        Self {
            total_time_ms: 600_000,
            max_timeouts: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Point-in-time view of the remaining budgets. Reads are racy on purpose; a
/// slightly stale value is fine because the gateway also fails fast at the
/// call site once a budget hits zero.
pub struct BudgetSnapshot {
    pub remaining_time_ms: u64,
    pub remaining_timeouts: u32,
}

impl BudgetSnapshot {
    pub fn exhausted(&self) -> Option<&'static str> {
        if self.remaining_time_ms == 0 {
            return Some("time");
        }
        if self.remaining_timeouts == 0 {
            return Some("timeouts");
        }
        None
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Debug)]
/// Mutex-guarded remaining-time / remaining-timeout record shared by every
/// expert through the gateway.
pub struct BudgetTracker {
    inner: Mutex<BudgetSnapshot>,
}

impl BudgetTracker {
    pub fn new(budgets: GatewayBudgets) -> Self {
        Self {
            inner: Mutex::new(BudgetSnapshot {
                remaining_time_ms: budgets.total_time_ms,
                remaining_timeouts: budgets.max_timeouts,
            }),
        }
    }

    pub fn snapshot(&self) -> BudgetSnapshot {
        *lock_unpoisoned(&self.inner)
    }

    pub fn exhausted(&self) -> Option<&'static str> {
        self.snapshot().exhausted()
    }

    /// Debits wall-clock spend after a call completes (success or failure).
    pub fn charge_elapsed(&self, elapsed_ms: u64) {
        let mut state = lock_unpoisoned(&self.inner);
        state.remaining_time_ms = state.remaining_time_ms.saturating_sub(elapsed_ms);
    }

    /// Debits one timeout after a call is cut off at its deadline.
    pub fn charge_timeout(&self) {
        let mut state = lock_unpoisoned(&self.inner);
        state.remaining_timeouts = state.remaining_timeouts.saturating_sub(1);
    }
}
