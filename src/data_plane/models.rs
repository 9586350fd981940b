//! Data models for data-plane requests and responses

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Vector record stored in an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// Unique identifier
    pub id: String,

    /// Dense embedding values
    #[serde(default)]
    pub values: Vec<f32>,

    /// Associated metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Vector {
    pub fn new(id: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            values,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpsertRequest<'a> {
    pub vectors: &'a [Vector],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<&'a str>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResponse {
    #[serde(default)]
    pub upserted_count: u64,
}

/// Similarity query, by vector or by the id of a stored vector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub top_k: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Metadata filter expression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,

    #[serde(default)]
    pub include_values: bool,

    #[serde(default)]
    pub include_metadata: bool,
}

impl QueryRequest {
    pub fn by_vector(vector: Vec<f32>, top_k: u32) -> Self {
        Self {
            vector: Some(vector),
            top_k,
            ..Self::default()
        }
    }

    pub fn by_id(id: impl Into<String>, top_k: u32) -> Self {
        Self {
            id: Some(id.into()),
            top_k,
            ..Self::default()
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_metadata(mut self) -> Self {
        self.include_metadata = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub matches: Vec<ScoredVector>,

    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredVector {
    pub id: String,
    pub score: f32,

    #[serde(default)]
    pub values: Vec<f32>,

    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(default)]
    pub vectors: HashMap<String, Vector>,

    #[serde(default)]
    pub namespace: String,
}

/// Which vectors to delete
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ids: Vec<String>,

    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub delete_all: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,
}

impl DeleteRequest {
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn all() -> Self {
        Self {
            delete_all: true,
            ..Self::default()
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    #[serde(default)]
    pub namespaces: HashMap<String, NamespaceSummary>,

    #[serde(default)]
    pub dimension: Option<u32>,

    #[serde(default)]
    pub index_fullness: f32,

    #[serde(default)]
    pub total_vector_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSummary {
    #[serde(default)]
    pub vector_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_request_wire_names() {
        let request = QueryRequest::by_vector(vec![0.1, 0.2], 5).with_metadata();
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["topK"], json!(5));
        assert_eq!(value["includeMetadata"], json!(true));
        assert!(value.get("id").is_none());
        assert!(value.get("namespace").is_none());
    }

    #[test]
    fn test_delete_request_omits_unset_fields() {
        let value = serde_json::to_value(DeleteRequest::ids(["a", "b"])).unwrap();
        assert_eq!(value, json!({"ids": ["a", "b"]}));

        let value = serde_json::to_value(DeleteRequest::all().in_namespace("ns")).unwrap();
        assert_eq!(value, json!({"deleteAll": true, "namespace": "ns"}));
    }

    #[test]
    fn test_stats_parse() {
        let stats: IndexStats = serde_json::from_value(json!({
            "namespaces": {"": {"vectorCount": 3}},
            "dimension": 2,
            "indexFullness": 0.0,
            "totalVectorCount": 3
        }))
        .unwrap();

        assert_eq!(stats.total_vector_count, 3);
        assert_eq!(stats.namespaces[""].vector_count, 3);
    }
}
