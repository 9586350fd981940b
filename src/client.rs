//! Top-level client wiring transport, control plane and host caches

use crate::config::ClientConfig;
use crate::control_plane::{AssistantResolver, ControlPlane, IndexResolver};
use crate::data_plane::{AssistantHandle, IndexHandle};
use crate::error::Result;
use crate::host_cache::ResourceHostCache;
use crate::retry::RetrySettings;
use crate::transport::HttpTransport;
use std::sync::Arc;
use tracing::info;

/// Entry point for control- and data-plane calls.
///
/// Host caches are held behind `Arc` so one cache can be shared by every
/// client in the process via [`VectorDbClient::with_host_caches`].
pub struct VectorDbClient {
    config: ClientConfig,
    transport: Arc<HttpTransport>,
    control: Arc<ControlPlane>,
    index_hosts: Arc<ResourceHostCache<IndexResolver>>,
    assistant_hosts: Arc<ResourceHostCache<AssistantResolver>>,
    retry: RetrySettings,
}

impl VectorDbClient {
    /// Create a client from validated configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let retry = RetrySettings::new(config.retry.to_policy());
        Self::with_retry_settings(config, retry)
    }

    /// Create a client whose calls retry with `retry` instead of the configured policy
    pub fn with_retry_settings(config: ClientConfig, retry: RetrySettings) -> Result<Self> {
        config.validate()?;
        retry.policy.validate()?;

        let transport = Arc::new(HttpTransport::new(&config)?);
        let client = Self::assemble(config, transport, retry);

        info!(
            "Initialized vector database client (max_retries={})",
            client.retry.policy.max_retries
        );
        Ok(client)
    }

    /// Create a client from `VECTORDB_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    fn assemble(config: ClientConfig, transport: Arc<HttpTransport>, retry: RetrySettings) -> Self {
        let control = Arc::new(ControlPlane::new(
            Arc::clone(&transport),
            config.controller_host.clone(),
            retry.clone(),
        ));

        let index_hosts = Arc::new(ResourceHostCache::new(IndexResolver::new(Arc::clone(&control))));
        let assistant_hosts = Arc::new(ResourceHostCache::new(AssistantResolver::new(Arc::clone(
            &control,
        ))));

        Self {
            config,
            transport,
            control,
            index_hosts,
            assistant_hosts,
            retry,
        }
    }

    /// Share host caches with other clients
    pub fn with_host_caches(
        mut self,
        index_hosts: Arc<ResourceHostCache<IndexResolver>>,
        assistant_hosts: Arc<ResourceHostCache<AssistantResolver>>,
    ) -> Self {
        self.index_hosts = index_hosts;
        self.assistant_hosts = assistant_hosts;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn control_plane(&self) -> &ControlPlane {
        &self.control
    }

    pub fn index_hosts(&self) -> &Arc<ResourceHostCache<IndexResolver>> {
        &self.index_hosts
    }

    pub fn assistant_hosts(&self) -> &Arc<ResourceHostCache<AssistantResolver>> {
        &self.assistant_hosts
    }

    /// Handle for an index whose host is resolved through the cache
    pub fn index(&self, name: &str) -> IndexHandle {
        IndexHandle::new(
            name,
            Arc::clone(&self.transport),
            Arc::clone(&self.index_hosts),
            self.retry.clone(),
        )
    }

    /// Handle for an index at a known host; no describe call is made
    pub fn index_with_host(&self, name: &str, host: &str) -> Result<IndexHandle> {
        self.index(name).with_host(host)
    }

    pub fn assistant(&self, name: &str) -> AssistantHandle {
        AssistantHandle::new(
            name,
            Arc::clone(&self.transport),
            Arc::clone(&self.assistant_hosts),
            self.retry.clone(),
        )
    }

    /// Delete an index and drop its cached host
    pub async fn delete_index(&self, name: &str) -> Result<()> {
        self.control.delete_index(name).await?;
        self.index_hosts.delete(self.transport.api_key(), name).await;
        Ok(())
    }
}
