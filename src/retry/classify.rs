//! Transient-failure classification shared by retrying call sites

use crate::error::ClientError;

/// Kind names that always denote a transient server-side failure
pub const TRANSIENT_ERROR_NAMES: &[&str] = &["UnavailableError", "InternalServerError"];

/// What the executor should do with a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Fail,
}

/// True when a kind name or status code marks a transient failure
pub fn is_transient(name: Option<&str>, status: Option<u16>) -> bool {
    let named = name.map_or(false, |n| TRANSIENT_ERROR_NAMES.contains(&n));
    let server_status = status.map_or(false, |s| s >= 500);
    named || server_status
}

/// Classify a failure.
///
/// An exhausted retry budget is never re-classified, and errors without a
/// status code only retry when `retry_connection_errors` is set.
pub fn classify(err: &ClientError, retry_connection_errors: bool) -> RetryDecision {
    match err {
        ClientError::MaxRetriesExceeded { .. } | ClientError::Cancelled => RetryDecision::Fail,
        ClientError::Connection(_) if retry_connection_errors => RetryDecision::Retry,
        _ if is_transient(Some(err.kind_name()), err.status()) => RetryDecision::Retry,
        _ => RetryDecision::Fail,
    }
}

/// Values a transport may resolve with even though they describe a failure
pub trait ErrorShape {
    /// Numeric status carried by the value
    fn shape_status(&self) -> Option<u16>;

    /// Declared error kind name carried by the value
    fn shape_name(&self) -> Option<&str> {
        None
    }

    /// The failure this value stands for, when it is shaped like a transient error
    fn transient_failure(&self) -> Option<ClientError> {
        let status = self.shape_status();
        let name = self.shape_name();
        if is_transient(name, status) {
            Some(ClientError::from_shape(name, status, "error-shaped response"))
        } else {
            None
        }
    }
}

impl ErrorShape for serde_json::Value {
    fn shape_status(&self) -> Option<u16> {
        self.get("status")
            .and_then(|s| s.as_u64())
            .and_then(|s| u16::try_from(s).ok())
    }

    fn shape_name(&self) -> Option<&str> {
        self.get("name").and_then(|n| n.as_str())
    }
}
