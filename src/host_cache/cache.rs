//! Process-wide host cache backed by moka

use super::{cache_key, normalize_host, HostResolver, ResourceKind};
use crate::error::{ClientError, Result};
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Caches resolved hosts per (credential, resource name).
///
/// Entries never expire; they are only removed by `delete` or `reset`.
/// Concurrent first lookups of the same key share one resolver call, and a
/// failed resolution is not cached. A `delete` or `reset` that lands while a
/// resolution is in flight wins: the late result is returned to its callers
/// but does not stay cached.
pub struct ResourceHostCache<R> {
    resolver: R,
    hosts: Cache<String, String>,
    invalidations: AtomicU64,
}

impl<R: HostResolver> ResourceHostCache<R> {
    /// Create an empty cache around `resolver`
    pub fn new(resolver: R) -> Self {
        info!("Initializing {} host cache", resolver.kind());

        Self {
            resolver,
            hosts: Cache::builder().build(),
            invalidations: AtomicU64::new(0),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.resolver.kind()
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Return the host for `resource_name`, resolving it on first use
    pub async fn get_host_url(&self, api_key: &str, resource_name: &str) -> Result<String> {
        let key = cache_key(api_key, resource_name);

        if let Some(host) = self.hosts.get(&key).await {
            debug!("Host cache hit for {} '{}'", self.kind(), resource_name);
            return Ok(host);
        }

        debug!("Host cache miss for {} '{}'", self.kind(), resource_name);
        let seen = self.invalidations.load(Ordering::SeqCst);
        let host = self
            .hosts
            .try_get_with(key.clone(), self.resolve(api_key, resource_name))
            .await
            .map_err(|err: Arc<ClientError>| (*err).clone())?;

        if self.invalidations.load(Ordering::SeqCst) != seen {
            debug!("Dropping {} '{}' host resolved across an invalidation", self.kind(), resource_name);
            self.hosts.invalidate(&key).await;
        }
        Ok(host)
    }

    async fn resolve(&self, api_key: &str, resource_name: &str) -> Result<String> {
        let resolved = self.resolver.resolve(api_key, resource_name).await?;
        let host = resolved
            .host
            .as_deref()
            .map(normalize_host)
            .unwrap_or_default();

        if host.is_empty() {
            warn!("Describe for {} '{}' returned no host", self.kind(), resource_name);
            return Err(ClientError::UnresolvableHost {
                kind: self.kind(),
                name: resource_name.to_string(),
            });
        }

        info!("Resolved {} '{}' to {}", self.kind(), resource_name, host);
        Ok(host)
    }

    /// Store a host; an empty host after normalization is ignored
    pub async fn set(&self, api_key: &str, resource_name: &str, host: &str) {
        let host = normalize_host(host);
        if host.is_empty() {
            debug!("Ignoring empty host for {} '{}'", self.kind(), resource_name);
            return;
        }

        self.hosts.insert(cache_key(api_key, resource_name), host).await;
    }

    /// Remove one entry; a miss is not an error
    pub async fn delete(&self, api_key: &str, resource_name: &str) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.hosts.invalidate(&cache_key(api_key, resource_name)).await;
        debug!("Invalidated host for {} '{}'", self.kind(), resource_name);
    }

    /// Remove every entry
    pub async fn reset(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.hosts.invalidate_all();
        self.hosts.run_pending_tasks().await;
        info!("{} host cache cleared", self.kind());
    }

    pub fn contains(&self, api_key: &str, resource_name: &str) -> bool {
        self.hosts.contains_key(&cache_key(api_key, resource_name))
    }

    /// Number of cached hosts
    pub async fn len(&self) -> u64 {
        self.hosts.run_pending_tasks().await;
        self.hosts.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_cache::ResolvedHost;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Resolver answering from a fixed (api key, name) table
    #[derive(Default)]
    struct TableResolver {
        hosts: HashMap<(String, String), String>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl TableResolver {
        fn with(mut self, api_key: &str, name: &str, host: &str) -> Self {
            self.hosts.insert((api_key.to_string(), name.to_string()), host.to_string());
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HostResolver for TableResolver {
        fn kind(&self) -> ResourceKind {
            ResourceKind::Index
        }

        async fn resolve(&self, api_key: &str, resource_name: &str) -> Result<ResolvedHost> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.hosts.get(&(api_key.to_string(), resource_name.to_string())) {
                Some(host) => Ok(ResolvedHost::new(host.clone())),
                None => Err(ClientError::NotFound(resource_name.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_resolves_once() {
        let cache = ResourceHostCache::new(
            TableResolver::default().with("key", "idx-1", "abc.example.io"),
        );

        for _ in 0..3 {
            let host = cache.get_host_url("key", "idx-1").await.unwrap();
            assert_eq!(host, "https://abc.example.io");
        }
        assert_eq!(cache.resolver().calls(), 1);
        assert!(cache.contains("key", "idx-1"));
    }

    #[tokio::test]
    async fn test_credentials_isolated() {
        let cache = ResourceHostCache::new(
            TableResolver::default()
                .with("key-a", "idx", "a.example.io")
                .with("key-b", "idx", "b.example.io"),
        );

        assert_eq!(cache.get_host_url("key-a", "idx").await.unwrap(), "https://a.example.io");
        assert_eq!(cache.get_host_url("key-b", "idx").await.unwrap(), "https://b.example.io");
        assert_eq!(cache.resolver().calls(), 2);

        cache.delete("key-a", "idx").await;
        assert!(!cache.contains("key-a", "idx"));
        assert!(cache.contains("key-b", "idx"));
    }

    #[tokio::test]
    async fn test_empty_set_is_noop() {
        let cache = ResourceHostCache::new(
            TableResolver::default().with("key", "idx", "real.example.io"),
        );

        cache.set("key", "idx", "").await;
        cache.set("key", "idx", "   ").await;
        cache.set("key", "idx", "https://").await;
        assert!(!cache.contains("key", "idx"));

        assert_eq!(cache.get_host_url("key", "idx").await.unwrap(), "https://real.example.io");
        assert_eq!(cache.resolver().calls(), 1);

        // an empty set must not clobber an existing entry either
        cache.set("key", "idx", "").await;
        assert_eq!(cache.get_host_url("key", "idx").await.unwrap(), "https://real.example.io");
        assert_eq!(cache.resolver().calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_resolved_host_is_error() {
        let cache = ResourceHostCache::new(TableResolver::default().with("key", "idx", ""));

        for _ in 0..2 {
            let err = cache.get_host_url("key", "idx").await.unwrap_err();
            assert_eq!(
                err,
                ClientError::UnresolvableHost {
                    kind: ResourceKind::Index,
                    name: "idx".to_string()
                }
            );
        }
        // nothing cached, so each lookup resolves again
        assert_eq!(cache.resolver().calls(), 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_resolver_error_not_cached() {
        let cache = ResourceHostCache::new(TableResolver::default());

        assert!(matches!(
            cache.get_host_url("key", "missing").await,
            Err(ClientError::NotFound(_))
        ));
        assert!(cache.get_host_url("key", "missing").await.is_err());
        assert_eq!(cache.resolver().calls(), 2);
    }

    #[tokio::test]
    async fn test_set_overrides_and_skips_resolution() {
        let cache = ResourceHostCache::new(
            TableResolver::default().with("key", "idx", "resolved.example.io"),
        );

        cache.set("key", "idx", "manual.example.io").await;
        assert_eq!(cache.get_host_url("key", "idx").await.unwrap(), "https://manual.example.io");

        cache.set("key", "idx", "https://other.example.io").await;
        assert_eq!(cache.get_host_url("key", "idx").await.unwrap(), "https://other.example.io");
        assert_eq!(cache.resolver().calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_forces_resolution() {
        let cache = ResourceHostCache::new(
            TableResolver::default().with("key", "idx", "abc.example.io"),
        );

        cache.get_host_url("key", "idx").await.unwrap();
        cache.delete("key", "idx").await;
        cache.delete("key", "never-cached").await;
        cache.get_host_url("key", "idx").await.unwrap();

        assert_eq!(cache.resolver().calls(), 2);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let cache = ResourceHostCache::new(
            TableResolver::default()
                .with("key", "a", "a.example.io")
                .with("key", "b", "b.example.io"),
        );

        cache.get_host_url("key", "a").await.unwrap();
        cache.get_host_url("key", "b").await.unwrap();
        assert_eq!(cache.len().await, 2);

        cache.reset().await;
        assert!(cache.is_empty().await);
        assert!(!cache.contains("key", "a"));
        assert!(!cache.contains("key", "b"));

        cache.get_host_url("key", "a").await.unwrap();
        assert_eq!(cache.resolver().calls(), 3);
    }

    #[tokio::test]
    async fn test_delete_during_resolution_wins() {
        let resolver = TableResolver {
            delay: Some(Duration::from_millis(50)),
            ..TableResolver::default()
        }
        .with("key", "idx", "abc.example.io");
        let cache = Arc::new(ResourceHostCache::new(resolver));

        let lookup = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_host_url("key", "idx").await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.delete("key", "idx").await;

        assert_eq!(lookup.await.unwrap().unwrap(), "https://abc.example.io");
        assert!(!cache.contains("key", "idx"));

        cache.get_host_url("key", "idx").await.unwrap();
        assert_eq!(cache.resolver().calls(), 2);
        assert!(cache.contains("key", "idx"));
    }

    #[tokio::test]
    async fn test_concurrent_first_lookups_single_flight() {
        let resolver = TableResolver {
            delay: Some(Duration::from_millis(50)),
            ..TableResolver::default()
        }
        .with("key", "idx", "abc.example.io");
        let cache = Arc::new(ResourceHostCache::new(resolver));

        let lookups = (0..8).map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_host_url("key", "idx").await })
        });

        for handle in futures::future::join_all(lookups).await {
            assert_eq!(handle.unwrap().unwrap(), "https://abc.example.io");
        }
        assert_eq!(cache.resolver().calls(), 1);
    }
}
