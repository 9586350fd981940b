//! Data-plane operations against a single index or assistant
//!
//! Each call first obtains the resource host (from the host cache, or a
//! manually supplied override) and then sends through a retry executor.

pub mod models;

pub use models::{
    DeleteRequest, FetchResponse, IndexStats, NamespaceSummary, QueryRequest, QueryResponse,
    ScoredVector, UpsertResponse, Vector,
};

use crate::control_plane::{AssistantResolver, IndexResolver};
use crate::error::{ClientError, Result};
use crate::host_cache::{normalize_host, ResourceHostCache};
use crate::retry::RetrySettings;
use crate::transport::{ApiRequest, HttpResponse, HttpTransport};
use models::UpsertRequest;
use reqwest::Method;
use std::sync::Arc;
use tracing::debug;

/// Handle for vector operations on one index
pub struct IndexHandle {
    name: String,
    transport: Arc<HttpTransport>,
    hosts: Arc<ResourceHostCache<IndexResolver>>,
    host_override: Option<String>,
    retry: RetrySettings,
}

impl IndexHandle {
    pub(crate) fn new(
        name: impl Into<String>,
        transport: Arc<HttpTransport>,
        hosts: Arc<ResourceHostCache<IndexResolver>>,
        retry: RetrySettings,
    ) -> Self {
        Self {
            name: name.into(),
            transport,
            hosts,
            host_override: None,
            retry,
        }
    }

    /// Target `host` directly instead of resolving it
    pub(crate) fn with_host(mut self, host: &str) -> Result<Self> {
        let host = normalize_host(host);
        if host.is_empty() {
            return Err(ClientError::InvalidArgument(format!(
                "Host for index '{}' cannot be empty",
                self.name
            )));
        }
        self.host_override = Some(host);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data-plane host for this index
    pub async fn host(&self) -> Result<String> {
        match &self.host_override {
            Some(host) => Ok(host.clone()),
            None => {
                self.hosts
                    .get_host_url(self.transport.api_key(), &self.name)
                    .await
            }
        }
    }

    /// Insert or overwrite vectors
    pub async fn upsert(&self, vectors: &[Vector], namespace: Option<&str>) -> Result<UpsertResponse> {
        if vectors.is_empty() {
            return Err(ClientError::InvalidArgument(
                "Upsert requires at least one vector".to_string(),
            ));
        }

        if let Some(vector) = vectors.iter().find(|v| v.id.is_empty() || v.values.is_empty()) {
            return Err(ClientError::InvalidArgument(format!(
                "Vector '{}' must have an id and values",
                vector.id
            )));
        }

        let body = serde_json::to_value(UpsertRequest { vectors, namespace })?;
        self.send("upsert", |host| ApiRequest::post(format!("{}/vectors/upsert", host), body))
            .await?
            .json()
    }

    /// Similarity search
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        if request.top_k == 0 {
            return Err(ClientError::InvalidArgument(
                "top_k must be greater than 0".to_string(),
            ));
        }

        if request.vector.is_some() == request.id.is_some() {
            return Err(ClientError::InvalidArgument(
                "Query requires exactly one of vector or id".to_string(),
            ));
        }

        let body = serde_json::to_value(request)?;
        self.send("query", |host| ApiRequest::post(format!("{}/query", host), body))
            .await?
            .json()
    }

    /// Fetch vectors by id
    pub async fn fetch<S: AsRef<str>>(&self, ids: &[S], namespace: Option<&str>) -> Result<FetchResponse> {
        if ids.is_empty() {
            return Err(ClientError::InvalidArgument(
                "Fetch requires at least one id".to_string(),
            ));
        }

        let ids: Vec<String> = ids.iter().map(|id| id.as_ref().to_string()).collect();
        let namespace = namespace.map(str::to_string);

        self.send("fetch", move |host| {
            let mut request = ApiRequest::get(format!("{}/vectors/fetch", host));
            for id in ids {
                request = request.with_query("ids", id);
            }
            if let Some(namespace) = namespace {
                request = request.with_query("namespace", namespace);
            }
            request
        })
        .await?
        .json()
    }

    /// Delete by ids, by filter, or everything in a namespace
    pub async fn delete(&self, request: &DeleteRequest) -> Result<()> {
        if request.ids.is_empty() && !request.delete_all && request.filter.is_none() {
            return Err(ClientError::InvalidArgument(
                "Delete requires ids, a filter, or delete_all".to_string(),
            ));
        }

        let body = serde_json::to_value(request)?;
        self.send("delete", |host| ApiRequest::post(format!("{}/vectors/delete", host), body))
            .await?;
        Ok(())
    }

    pub async fn describe_stats(&self) -> Result<IndexStats> {
        self.send("describe_index_stats", |host| {
            ApiRequest::post(
                format!("{}/describe_index_stats", host),
                serde_json::json!({}),
            )
        })
        .await?
        .json()
    }

    async fn send<B>(&self, operation: &str, build: B) -> Result<HttpResponse>
    where
        B: FnOnce(String) -> ApiRequest,
    {
        let host = self.host().await?;
        let request = build(host);
        debug!("{} on index '{}' -> {}", operation, self.name, request.url);

        self.retry
            .executor(self.transport.operation(), operation)?
            .execute(request)
            .await
    }
}

/// Handle for calls against one assistant's data plane
pub struct AssistantHandle {
    name: String,
    transport: Arc<HttpTransport>,
    hosts: Arc<ResourceHostCache<AssistantResolver>>,
    retry: RetrySettings,
}

impl AssistantHandle {
    pub(crate) fn new(
        name: impl Into<String>,
        transport: Arc<HttpTransport>,
        hosts: Arc<ResourceHostCache<AssistantResolver>>,
        retry: RetrySettings,
    ) -> Self {
        Self {
            name: name.into(),
            transport,
            hosts,
            retry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn host(&self) -> Result<String> {
        self.hosts
            .get_host_url(self.transport.api_key(), &self.name)
            .await
    }

    /// Send a JSON request to `path` on the assistant host
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let host = self.host().await?;
        let mut request = ApiRequest::new(method, format!("{}/{}", host, path.trim_start_matches('/')));
        if let Some(body) = body {
            request = request.with_body(body);
        }

        self.retry
            .executor(self.transport.operation(), "assistant_request")?
            .execute(request)
            .await?
            .json()
    }
}
