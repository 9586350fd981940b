//! Resolution and caching of resource hosts
//!
//! Data-plane calls go to a per-resource host that must first be looked up
//! with a control-plane describe call. The cache keeps that lookup to once
//! per (credential, resource name) pair.

pub mod cache;

pub use cache::ResourceHostCache;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Kind of resource whose host is being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Index,
    Assistant,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Index => "index",
            ResourceKind::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host field extracted from a describe response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedHost {
    pub host: Option<String>,
}

impl ResolvedHost {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
        }
    }

    pub fn missing() -> Self {
        Self { host: None }
    }
}

/// Looks up the host of a named resource, typically via a describe call
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Kind of resource this resolver describes
    fn kind(&self) -> ResourceKind;

    /// Describe `resource_name` using `api_key` and return its host field
    async fn resolve(&self, api_key: &str, resource_name: &str) -> Result<ResolvedHost>;
}

/// Cache key for a (credential, resource name) pair.
///
/// The credential is hashed so raw keys never sit in the map; the hex digest
/// cannot contain the separator, so distinct pairs never collide.
pub fn cache_key(api_key: &str, resource_name: &str) -> String {
    let digest = Sha256::digest(api_key.as_bytes());
    format!("{}-{}", hex::encode(digest), resource_name)
}

/// Normalize a host to carry exactly one scheme prefix.
///
/// The first scheme found is kept (`https://` when there is none) and any
/// repeated scheme after it is dropped. Returns an empty string when nothing
/// usable remains.
pub fn normalize_host(raw: &str) -> String {
    let mut remainder = raw.trim();
    let mut scheme = None;

    while let Some((prefix, rest)) = split_scheme(remainder) {
        scheme.get_or_insert(prefix);
        remainder = rest.trim_start_matches('/');
    }

    let remainder = remainder.trim_end_matches('/');
    if remainder.is_empty() {
        return String::new();
    }

    format!("{}{}", scheme.unwrap_or("https://"), remainder)
}

fn split_scheme(host: &str) -> Option<(&'static str, &str)> {
    ["https://", "http://"].into_iter().find_map(|prefix| {
        host.get(..prefix.len())
            .filter(|head| head.eq_ignore_ascii_case(prefix))
            .map(|_| (prefix, &host[prefix.len()..]))
    })
}
