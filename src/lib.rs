//! Vector DB Client - async client for a hosted vector database
//!
//! Control-plane calls (describe, list, delete) and data-plane calls (upsert,
//! query, fetch, delete) are sent through a single HTTP transport and wrapped
//! in a retry executor that backs off on transient server failures.
//!
//! ## Features
//!
//! - **Retry with Backoff**: Exponential delay with jitter, bounded attempts, 5xx-only retries
//! - **Host Caching**: Each index or assistant host is described once per credential and reused
//! - **Typed Errors**: Every failure maps to one [`ClientError`] variant
//! - **Configuration**: TOML files and `VECTORDB_*` environment variables
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vectordb_client::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = VectorDbClient::new(ClientConfig::new("my-api-key"))?;
//!
//!     let index = client.index("products");
//!     index.upsert(&[Vector::new("sku-1", vec![0.1, 0.2, 0.3])], None).await?;
//!
//!     let results = index
//!         .query(&QueryRequest::by_vector(vec![0.1, 0.2, 0.3], 5))
//!         .await?;
//!     println!("{} matches", results.matches.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod control_plane;
pub mod data_plane;
pub mod error;
pub mod host_cache;
pub mod observability;
pub mod retry;
pub mod transport;

pub use client::VectorDbClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::VectorDbClient;
    pub use crate::config::{ClientConfig, RetryConfig};
    pub use crate::data_plane::{DeleteRequest, IndexHandle, QueryRequest, Vector};
    pub use crate::error::{ClientError, Result};
    pub use crate::host_cache::{HostResolver, ResolvedHost, ResourceHostCache, ResourceKind};
    pub use crate::retry::{RetryExecutor, RetryPolicy, RetrySettings};
}
