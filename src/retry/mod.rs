//! Retry with exponential backoff for remote operations

pub mod cancel;
pub mod classify;
pub mod executor;

pub use cancel::CancellationSignal;
pub use classify::{classify, ErrorShape, RetryDecision, TRANSIENT_ERROR_NAMES};
pub use executor::{RetryExecutor, Sleeper, TokioSleeper};

use crate::error::{ClientError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Tunables for one retrying call site
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts allowed; 0 means a single attempt with no retry handling
    pub max_retries: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Upper bound applied after jitter
    pub max_delay: Duration,

    /// Fraction of the delay used as symmetric jitter amplitude
    pub jitter_factor: f64,

    /// Treat connection failures (no status code) as transient
    pub retry_connection_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: RetryPolicy::DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(20_000),
            jitter_factor: 0.25,
            retry_connection_errors: false,
        }
    }
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const MAX_RETRIES_CEILING: u32 = 10;

    /// Default policy with a specific retry count
    pub fn with_max_retries(max_retries: u32) -> Result<Self> {
        let policy = Self {
            max_retries,
            ..Self::default()
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Reject settings the executor cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.max_retries > Self::MAX_RETRIES_CEILING {
            return Err(ClientError::Config(format!(
                "Max retries too large: {} (max: {})",
                self.max_retries,
                Self::MAX_RETRIES_CEILING
            )));
        }

        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(ClientError::Config(
                "Jitter factor must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.base_delay > self.max_delay {
            return Err(ClientError::Config(
                "Base delay cannot exceed max delay".to_string(),
            ));
        }

        Ok(())
    }

    /// Backoff before the retry following `retry_index` completed retries.
    ///
    /// `sample` is a uniform random value in `[0, 1)`; 0.5 yields the un-jittered delay.
    pub fn delay_for(&self, retry_index: u32, sample: f64) -> Duration {
        let exponent = retry_index.min(63) as i32;
        let mut delay = self.base_delay.as_millis() as f64 * 2f64.powi(exponent);
        delay += delay * self.jitter_factor * (sample - 0.5);

        let max = self.max_delay.as_millis() as f64;
        Duration::from_millis(delay.clamp(0.0, max) as u64)
    }
}

/// A policy bundled with the sleeper every executor it builds should use
#[derive(Clone)]
pub struct RetrySettings {
    pub policy: RetryPolicy,
    pub sleeper: Arc<dyn Sleeper>,
}

impl RetrySettings {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Build a named executor for one call
    pub fn executor<F>(&self, operation: F, name: &str) -> Result<RetryExecutor<F>> {
        Ok(RetryExecutor::with_policy(operation, self.policy.clone())?
            .with_sleeper(Arc::clone(&self.sleeper))
            .named(name))
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl std::fmt::Debug for RetrySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrySettings")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(200));
        assert_eq!(policy.max_delay, Duration::from_millis(20_000));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_ceiling_rejected() {
        assert!(RetryPolicy::with_max_retries(10).is_ok());
        assert!(matches!(
            RetryPolicy::with_max_retries(11),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_delay_doubles_without_jitter() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(10),
            ..RetryPolicy::default()
        };

        assert_eq!(policy.delay_for(0, 0.5), Duration::from_millis(10));
        assert_eq!(policy.delay_for(1, 0.5), Duration::from_millis(20));
        assert_eq!(policy.delay_for(2, 0.5), Duration::from_millis(40));
    }

    #[test]
    fn test_delay_jitter_bounds() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(1000),
            ..RetryPolicy::default()
        };

        // amplitude 0.25 => +/- 12.5%
        assert_eq!(policy.delay_for(0, 0.0), Duration::from_millis(875));
        assert_eq!(policy.delay_for(0, 1.0), Duration::from_millis(1125));
    }

    #[test]
    fn test_delay_clamped_to_max() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(1000),
            ..RetryPolicy::default()
        };

        assert_eq!(policy.delay_for(10, 0.5), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(u32::MAX, 1.0), Duration::from_millis(1000));
    }
}
