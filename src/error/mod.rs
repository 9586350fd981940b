//! Error types for the vector database client

use crate::host_cache::ResourceKind;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Main error type for the client
///
/// Every failure a caller can observe is one of these variants; raw transport
/// errors are translated at the transport boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Authorization failed: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Internal server error: {0}")]
    InternalServer(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Client error {status}: {message}")]
    Client { status: u16, message: String },

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected status {status}: {message}")]
    UnmappedStatus { status: u16, message: String },

    #[error("Max retries ({max_retries}) exceeded")]
    MaxRetriesExceeded {
        max_retries: u32,
        /// Failures of each attempt, oldest first
        errors: Vec<ClientError>,
    },

    #[error("Unable to resolve host for {kind} '{name}'")]
    UnresolvableHost { kind: ResourceKind, name: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl ClientError {
    /// Map an HTTP status code onto the error taxonomy
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => ClientError::BadRequest(message),
            401 => ClientError::Unauthorized(message),
            403 => ClientError::Forbidden(message),
            404 => ClientError::NotFound(message),
            409 => ClientError::Conflict(message),
            429 => ClientError::RateLimited(message),
            500 => ClientError::InternalServer(message),
            503 => ClientError::Unavailable(message),
            402..=499 => ClientError::Client { status, message },
            501..=599 => ClientError::Server { status, message },
            _ => ClientError::UnmappedStatus { status, message },
        }
    }

    /// Map a value that describes a failure by kind name and/or status code.
    ///
    /// A transient kind name wins over whatever status accompanies it.
    pub fn from_shape(name: Option<&str>, status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        match (name, status) {
            (Some("UnavailableError"), _) => ClientError::Unavailable(message),
            (Some("InternalServerError"), _) => ClientError::InternalServer(message),
            (_, Some(status)) => ClientError::from_status(status, message),
            (Some(other), None) => ClientError::Request(format!("{}: {}", other, message)),
            (None, None) => ClientError::Request(message),
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::BadRequest(_) => Some(400),
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Forbidden(_) => Some(403),
            ClientError::NotFound(_) => Some(404),
            ClientError::Conflict(_) => Some(409),
            ClientError::RateLimited(_) => Some(429),
            ClientError::InternalServer(_) => Some(500),
            ClientError::Unavailable(_) => Some(503),
            ClientError::Client { status, .. }
            | ClientError::Server { status, .. }
            | ClientError::UnmappedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Stable kind name used for classification and diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            ClientError::BadRequest(_) => "BadRequestError",
            ClientError::Unauthorized(_) => "AuthorizationError",
            ClientError::Forbidden(_) => "ForbiddenError",
            ClientError::NotFound(_) => "NotFoundError",
            ClientError::Conflict(_) => "ConflictError",
            ClientError::RateLimited(_) => "RateLimitError",
            ClientError::InternalServer(_) => "InternalServerError",
            ClientError::Unavailable(_) => "UnavailableError",
            ClientError::Client { .. } => "ClientError",
            ClientError::Server { .. } => "ServerError",
            ClientError::UnmappedStatus { .. } => "UnmappedHttpError",
            ClientError::MaxRetriesExceeded { .. } => "MaxRetriesExceededError",
            ClientError::UnresolvableHost { .. } => "UnresolvableHostError",
            ClientError::Connection(_) => "ConnectionError",
            ClientError::Request(_) => "RequestError",
            ClientError::Serialization(_) => "SerializationError",
            ClientError::InvalidArgument(_) => "InvalidArgumentError",
            ClientError::Config(_) => "ConfigurationError",
            ClientError::Cancelled => "CancelledError",
        }
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}
