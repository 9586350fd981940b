//! Control-plane response models

use serde::{Deserialize, Serialize};

/// Description of an index as returned by the control plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDescription {
    pub name: String,

    #[serde(default)]
    pub dimension: Option<u32>,

    #[serde(default)]
    pub metric: Option<String>,

    /// Data-plane host; may be absent while the index is initializing
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub status: Option<IndexStatus>,
}

/// Readiness reported for an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStatus {
    pub ready: bool,
    pub state: String,
}

/// Index listing envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexList {
    #[serde(default)]
    pub indexes: Vec<IndexDescription>,
}

/// Description of an assistant as returned by the control plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantDescription {
    pub name: String,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub host: Option<String>,
}
