//! HTTP transport shared by control- and data-plane calls
//!
//! Every request goes through [`HttpTransport::execute`] or
//! [`HttpTransport::execute_raw`], which is the only place reqwest failures
//! and non-success statuses are translated into [`ClientError`].

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::retry::ErrorShape;
use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

const API_KEY_HEADER: &str = "Api-Key";
const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// One outgoing API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    api_key: Option<Arc<Secret<String>>>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: None,
            api_key: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Send with a different credential than the transport's own
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(Arc::new(Secret::new(api_key.to_string())));
        self
    }
}

/// Status and body of a completed call
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body; an empty body reads as JSON `null`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let body = if self.body.trim().is_empty() { "null" } else { &self.body };
        Ok(serde_json::from_str(body)?)
    }
}

impl ErrorShape for HttpResponse {
    fn shape_status(&self) -> Option<u16> {
        (!self.is_success()).then_some(self.status)
    }
}

/// reqwest-backed transport carrying the client's credential and headers
pub struct HttpTransport {
    http_client: Client,
    api_key: Arc<Secret<String>>,
    additional_headers: HashMap<String, String>,
}

impl HttpTransport {
    /// Build a transport from client configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        info!("Initialized HTTP transport with timeout={}s", config.timeout_secs);

        Ok(Self::with_http_client(config, http_client))
    }

    /// Create transport with custom HTTP client
    pub fn with_http_client(config: &ClientConfig, http_client: Client) -> Self {
        Self {
            http_client,
            api_key: Arc::new(Secret::new(config.api_key.expose_secret().clone())),
            additional_headers: config.additional_headers.clone(),
        }
    }

    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Send a request and fail on any non-success status
    pub async fn execute(&self, request: ApiRequest) -> Result<HttpResponse> {
        let response = self.execute_raw(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ClientError::from_status(
                response.status,
                error_message(&response.body),
            ))
        }
    }

    /// Send a request and return the response whatever its status
    pub async fn execute_raw(&self, request: ApiRequest) -> Result<HttpResponse> {
        let request_id = Uuid::new_v4();
        let api_key = request.api_key.as_ref().unwrap_or(&self.api_key);

        debug!("{} {} (request {})", request.method, request.url, request_id);

        let mut builder = self
            .http_client
            .request(request.method.clone(), &request.url)
            .header(API_KEY_HEADER, api_key.expose_secret().as_str())
            .header(REQUEST_ID_HEADER, request_id.to_string());

        for (name, value) in &self.additional_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;

        debug!("Request {} completed with status {}", request_id, status);
        Ok(HttpResponse { status, body })
    }

    /// The `execute` call as a standalone operation for a `RetryExecutor`
    pub fn operation(
        self: &Arc<Self>,
    ) -> impl Fn(ApiRequest) -> BoxFuture<'static, Result<HttpResponse>> + Send + Sync {
        let transport = Arc::clone(self);
        move |request| {
            let transport = Arc::clone(&transport);
            async move { transport.execute(request).await }.boxed()
        }
    }

    /// The `execute_raw` call as a standalone operation, for `execute_checked`
    pub fn raw_operation(
        self: &Arc<Self>,
    ) -> impl Fn(ApiRequest) -> BoxFuture<'static, Result<HttpResponse>> + Send + Sync {
        let transport = Arc::clone(self);
        move |request| {
            let transport = Arc::clone(&transport);
            async move { transport.execute_raw(request).await }.boxed()
        }
    }
}

/// Translate a reqwest failure into the client taxonomy
fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if let Some(status) = err.status() {
        ClientError::from_status(status.as_u16(), err.to_string())
    } else if err.is_connect() || err.is_timeout() {
        ClientError::Connection(err.to_string())
    } else if err.is_decode() {
        ClientError::Serialization(err.to_string())
    } else {
        ClientError::Request(err.to_string())
    }
}

/// Pull a human-readable message out of an error body
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|value| {
        value
            .pointer("/error/message")
            .or_else(|| value.get("message"))
            .and_then(|m| m.as_str())
    });

    match message {
        Some(message) => message.to_string(),
        None if body.trim().is_empty() => "no response body".to_string(),
        None => body.trim().to_string(),
    }
}
