// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! When a failed item is tried again, and when it is given up on.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tq_core::QueueItem;

/// How soon a failed item becomes eligible again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStrategy {
    /// Retry on the next drain, however soon it comes.
    NextTrigger,
    /// Wait `base * 2^(attempts - 1)`, capped at `max`, after the last failure.
    Backoff { base: Duration, max: Duration },
}

/// Retry timing plus the optional give-up threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub strategy: RetryStrategy,
    /// Attempts after which an item is abandoned. `None` keeps it forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::next_trigger()
    }
}

impl RetryPolicy {
    pub fn next_trigger() -> Self {
        RetryPolicy { strategy: RetryStrategy::NextTrigger, max_attempts: None }
    }

    pub fn backoff(base: Duration, max: Duration) -> Self {
        RetryPolicy { strategy: RetryStrategy::Backoff { base, max }, max_attempts: None }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay owed after `attempts` failures.
    pub fn delay_after(&self, attempts: u32) -> Duration {
        match self.strategy {
            RetryStrategy::NextTrigger => Duration::ZERO,
            RetryStrategy::Backoff { .. } if attempts == 0 => Duration::ZERO,
            RetryStrategy::Backoff { base, max } => {
                let factor = 2u32.checked_pow(attempts - 1).unwrap_or(u32::MAX);
                base.saturating_mul(factor).min(max)
            }
        }
    }

    /// Earliest time `item` may be sent again, or `None` if it owes no delay.
    pub fn due_at(&self, item: &QueueItem) -> Option<DateTime<Utc>> {
        let last = item.last_attempt_at?;
        let delay = self.delay_after(item.attempts);
        if delay.is_zero() {
            return None;
        }
        let delay = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX);
        Some(last.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    pub fn is_due(&self, item: &QueueItem, now: DateTime<Utc>) -> bool {
        match self.due_at(item) {
            Some(at) => at <= now,
            None => true,
        }
    }

    /// True once `attempts` failures reach the give-up threshold.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }

    /// Time until the earliest backed-off item becomes due.
    ///
    /// Zero if one is already due; `None` when no item is waiting on a delay.
    pub fn next_wakeup(&self, items: &[QueueItem], now: DateTime<Utc>) -> Option<Duration> {
        items
            .iter()
            .filter_map(|item| self.due_at(item))
            .min()
            .map(|at| (at - now).to_std().unwrap_or(Duration::ZERO))
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
