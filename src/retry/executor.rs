//! Retry executor wrapping a single remote operation

use super::cancel::CancellationSignal;
use super::classify::{classify, ErrorShape, RetryDecision};
use super::RetryPolicy;
use crate::error::{ClientError, Result};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Source of backoff waits; swapped out in tests to avoid real sleeping
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Executes one logical operation, retrying transient failures with
/// exponential backoff and jitter.
///
/// An executor is built per call and consumed by `execute`. The operation is
/// invoked at most `max_retries` times in total; the first attempt counts
/// against that budget.
pub struct RetryExecutor<F> {
    operation: F,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    cancel: Option<CancellationSignal>,
    name: String,
}

impl<F> RetryExecutor<F> {
    /// Create an executor with the default policy and an optional retry count (default 3).
    ///
    /// Counts above 10 are rejected with a configuration error.
    pub fn new(operation: F, max_retries: Option<u32>) -> Result<Self> {
        let policy = RetryPolicy::with_max_retries(
            max_retries.unwrap_or(RetryPolicy::DEFAULT_MAX_RETRIES),
        )?;
        Ok(Self::build(operation, policy))
    }

    /// Create an executor with a fully specified policy
    pub fn with_policy(operation: F, policy: RetryPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self::build(operation, policy))
    }

    fn build(operation: F, policy: RetryPolicy) -> Self {
        Self {
            operation,
            policy,
            sleeper: Arc::new(TokioSleeper),
            cancel: None,
            name: "operation".to_string(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Abort at the next suspension point once `signal` fires
    pub fn with_cancellation(mut self, signal: CancellationSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// Label used in log output
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.policy.max_retries
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke the operation with `args`, retrying failed calls classified as transient
    pub async fn execute<A, Fut, T, E>(self, args: A) -> Result<T>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<ClientError>,
        A: Clone,
    {
        self.run(args, |_: &T| None).await
    }

    /// Like `execute`, but a successful value shaped like a transient error is
    /// also treated as a failed attempt.
    pub async fn execute_checked<A, Fut, T, E>(self, args: A) -> Result<T>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<ClientError>,
        A: Clone,
        T: ErrorShape,
    {
        self.run(args, |value: &T| value.transient_failure()).await
    }

    async fn run<A, Fut, T, E, I>(self, args: A, inspect: I) -> Result<T>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<ClientError>,
        A: Clone,
        I: Fn(&T) -> Option<ClientError>,
    {
        let max_retries = self.policy.max_retries;

        if max_retries < 1 {
            self.ensure_not_cancelled()?;
            return self.cancellable((self.operation)(args)).await?.map_err(Into::into);
        }

        let mut failures = Vec::new();

        for attempt in 0..max_retries {
            self.ensure_not_cancelled()?;

            let failure = match self.cancellable((self.operation)(args.clone())).await? {
                Ok(value) => match inspect(&value) {
                    None => {
                        debug!("{} succeeded on attempt {}", self.name, attempt + 1);
                        return Ok(value);
                    }
                    Some(err) => err,
                },
                Err(err) => err.into(),
            };

            if classify(&failure, self.policy.retry_connection_errors) == RetryDecision::Fail {
                debug!("{} failed with non-retryable error: {}", self.name, failure);
                return Err(failure);
            }

            warn!(
                "{} failed on attempt {}/{}: {}",
                self.name,
                attempt + 1,
                max_retries,
                failure
            );
            failures.push(failure);

            if attempt + 1 < max_retries {
                let delay = self.policy.delay_for(attempt, rand::random::<f64>());
                debug!("Retrying {} after {}ms", self.name, delay.as_millis());
                self.cancellable(self.sleeper.sleep(delay)).await?;
            }
        }

        error!("{} exhausted {} attempts", self.name, max_retries);
        Err(ClientError::MaxRetriesExceeded {
            max_retries,
            errors: failures,
        })
    }

    fn ensure_not_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(signal) if signal.is_cancelled() => Err(ClientError::Cancelled),
            _ => Ok(()),
        }
    }

    async fn cancellable<Fut: Future>(&self, fut: Fut) -> Result<Fut::Output> {
        match &self.cancel {
            None => Ok(fut.await),
            Some(signal) => tokio::select! {
                output = fut => Ok(output),
                _ = signal.cancelled() => {
                    debug!("{} cancelled", self.name);
                    Err(ClientError::Cancelled)
                }
            },
        }
    }
}
