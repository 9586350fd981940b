//! Control-plane operations and the host resolvers built on them

pub mod models;

pub use models::{AssistantDescription, IndexDescription, IndexList, IndexStatus};

use crate::error::{ClientError, Result};
use crate::host_cache::{HostResolver, ResolvedHost, ResourceKind};
use crate::retry::RetrySettings;
use crate::transport::{ApiRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Client for index and assistant lifecycle calls
pub struct ControlPlane {
    transport: Arc<HttpTransport>,
    controller_host: String,
    retry: RetrySettings,
}

impl ControlPlane {
    pub fn new(
        transport: Arc<HttpTransport>,
        controller_host: impl Into<String>,
        retry: RetrySettings,
    ) -> Self {
        let controller_host = controller_host.into().trim_end_matches('/').to_string();
        info!("Control plane at {}", controller_host);

        Self {
            transport,
            controller_host,
            retry,
        }
    }

    pub fn controller_host(&self) -> &str {
        &self.controller_host
    }

    /// Describe an index, including its data-plane host
    pub async fn describe_index(&self, name: &str) -> Result<IndexDescription> {
        self.describe_index_as(None, name).await
    }

    pub(crate) async fn describe_index_as(
        &self,
        api_key: Option<&str>,
        name: &str,
    ) -> Result<IndexDescription> {
        require_name(name, "Index")?;
        let request = with_credential(ApiRequest::get(self.url(&format!("/indexes/{}", name))), api_key);
        self.send(request, "describe_index").await?.json()
    }

    /// Describe an assistant, including its data-plane host
    pub async fn describe_assistant(&self, name: &str) -> Result<AssistantDescription> {
        self.describe_assistant_as(None, name).await
    }

    pub(crate) async fn describe_assistant_as(
        &self,
        api_key: Option<&str>,
        name: &str,
    ) -> Result<AssistantDescription> {
        require_name(name, "Assistant")?;
        let request = with_credential(
            ApiRequest::get(self.url(&format!("/assistant/assistants/{}", name))),
            api_key,
        );
        self.send(request, "describe_assistant").await?.json()
    }

    pub async fn list_indexes(&self) -> Result<Vec<IndexDescription>> {
        let list: IndexList = self
            .send(ApiRequest::get(self.url("/indexes")), "list_indexes")
            .await?
            .json()?;
        Ok(list.indexes)
    }

    /// Delete an index; callers holding a host cache should invalidate it
    pub async fn delete_index(&self, name: &str) -> Result<()> {
        require_name(name, "Index")?;
        self.send(
            ApiRequest::delete(self.url(&format!("/indexes/{}", name))),
            "delete_index",
        )
        .await?;
        info!("Deleted index '{}'", name);
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.controller_host, path)
    }

    async fn send(&self, request: ApiRequest, operation: &str) -> Result<HttpResponse> {
        debug!("Control plane {} {}", operation, request.url);
        self.retry
            .executor(self.transport.operation(), operation)?
            .execute(request)
            .await
    }
}

fn require_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ClientError::InvalidArgument(format!("{} name cannot be empty", what)));
    }
    Ok(())
}

fn with_credential(request: ApiRequest, api_key: Option<&str>) -> ApiRequest {
    match api_key {
        Some(key) => request.with_api_key(key),
        None => request,
    }
}

/// Resolves index hosts via `describe_index`
pub struct IndexResolver {
    control: Arc<ControlPlane>,
}

impl IndexResolver {
    pub fn new(control: Arc<ControlPlane>) -> Self {
        Self { control }
    }
}

#[async_trait]
impl HostResolver for IndexResolver {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Index
    }

    async fn resolve(&self, api_key: &str, resource_name: &str) -> Result<ResolvedHost> {
        let description = self.control.describe_index_as(Some(api_key), resource_name).await?;
        Ok(ResolvedHost { host: description.host })
    }
}

/// Resolves assistant hosts via `describe_assistant`
pub struct AssistantResolver {
    control: Arc<ControlPlane>,
}

impl AssistantResolver {
    pub fn new(control: Arc<ControlPlane>) -> Self {
        Self { control }
    }
}

#[async_trait]
impl HostResolver for AssistantResolver {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Assistant
    }

    async fn resolve(&self, api_key: &str, resource_name: &str) -> Result<ResolvedHost> {
        let description = self.control.describe_assistant_as(Some(api_key), resource_name).await?;
        Ok(ResolvedHost { host: description.host })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn control_plane(host: &str) -> ControlPlane {
        let config = ClientConfig::new("key");
        let transport = Arc::new(HttpTransport::new(&config).unwrap());
        ControlPlane::new(transport, host, RetrySettings::default())
    }

    #[test]
    fn test_controller_host_trailing_slash() {
        let control = control_plane("https://control.example.io/");
        assert_eq!(control.controller_host(), "https://control.example.io");
        assert_eq!(control.url("/indexes"), "https://control.example.io/indexes");
    }

    #[tokio::test]
    async fn test_empty_name_rejected_before_network() {
        let control = control_plane("http://127.0.0.1:9");
        assert!(matches!(
            control.describe_index("").await,
            Err(ClientError::InvalidArgument(_))
        ));
        assert!(matches!(
            control.describe_assistant("  ").await,
            Err(ClientError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_description_without_host() {
        let description: IndexDescription =
            serde_json::from_str(r#"{"name":"idx","dimension":8,"status":{"ready":false,"state":"Initializing"}}"#)
                .unwrap();
        assert_eq!(description.host, None);
        assert_eq!(description.dimension, Some(8));
    }
}
