/*!
 * Retry policy for translation requests.
 *
 * Transient provider failures are retried with exponential backoff and
 * jitter. Everything else fails the batch immediately.
 */

use rand::Rng;
use std::time::Duration;

use crate::errors::ProviderError;

/// Outcome of a single translation attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// The provider returned translated text
    Success(Vec<String>),
    /// The provider failed in a way that may clear up on retry
    Transient(ProviderError),
    /// Retrying cannot help
    Fatal(ProviderError),
}

impl From<Result<Vec<String>, ProviderError>> for AttemptOutcome {
    fn from(result: Result<Vec<String>, ProviderError>) -> Self {
        match result {
            Ok(texts) => Self::Success(texts),
            Err(e) if e.is_transient() => Self::Transient(e),
            Err(e) => Self::Fatal(e),
        }
    }
}

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled for every further retry
    pub base_delay_ms: u64,
    /// Cap for a single delay
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Total number of attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Whether another attempt is allowed after `attempts` have been made
    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts <= self.max_retries
    }

    /// Delay before retry number `retry` (0-based), without jitter
    pub fn backoff_ms(&self, retry: u32) -> u64 {
        let factor = 1u64.checked_shl(retry.min(63)).unwrap_or(u64::MAX);
        self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms)
    }

    /// Delay before retry number `retry`, jittered uniformly in `[delay/2, delay]`
    pub fn delay_for(&self, retry: u32) -> Duration {
        let ceiling = self.backoff_ms(retry);
        if ceiling == 0 {
            return Duration::ZERO;
        }

        let jittered = rand::rng().random_range(ceiling / 2..=ceiling);
        Duration::from_millis(jittered)
    }
}
