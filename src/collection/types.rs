//! Collection and environment document types
//!
//! These follow the Postman collection v2.1 and environment formats. Only the
//! fields probekeeper reads are typed; everything else is kept in `extra` so a
//! document survives a load/save cycle unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::utils::{DocumentError, read_json};

/// Collection metadata block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Display name of the collection
    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single top-level entry of a collection (a request or a folder)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Request definition: either an object or a bare URL string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CollectionItem {
    /// Item name, empty if unnamed
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// HTTP method of the request, `GET` when unspecified
    pub fn method(&self) -> Option<String> {
        match self.request.as_ref()? {
            Value::String(_) => Some("GET".to_string()),
            Value::Object(request) => Some(
                request
                    .get("method")
                    .and_then(Value::as_str)
                    .unwrap_or("GET")
                    .to_string(),
            ),
            _ => None,
        }
    }

    /// Raw request URL
    pub fn url(&self) -> Option<String> {
        match self.request.as_ref()? {
            Value::String(url) => Some(url.clone()),
            Value::Object(request) => match request.get("url")? {
                Value::String(url) => Some(url.clone()),
                Value::Object(url) => url.get("raw").and_then(Value::as_str).map(str::to_string),
                _ => None,
            },
            _ => None,
        }
    }
}

/// An ordered collection of requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionDocument {
    #[serde(default)]
    pub info: CollectionInfo,

    /// Top-level items; order is significant
    #[serde(default)]
    pub item: Vec<CollectionItem>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CollectionDocument {
    /// Load a collection from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        read_json(path)
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Number of top-level items
    pub fn len(&self) -> usize {
        self.item.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item.is_empty()
    }
}

/// A single variable of an environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentValue {
    pub key: String,

    #[serde(default)]
    pub value: Value,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

/// Named key/value set injected as variables during a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub values: Vec<EnvironmentValue>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnvironmentDocument {
    /// Load an environment from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        read_json(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_collection() {
        let doc: CollectionDocument = serde_json::from_value(json!({
            "info": {"name": "Pets", "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"},
            "item": [
                {"name": "List pets", "request": {"method": "GET", "url": {"raw": "https://api.test/pets"}}},
                {"name": "Create pet", "request": {"method": "POST", "url": "https://api.test/pets"}}
            ],
            "variable": []
        }))
        .unwrap();

        assert_eq!(doc.name(), "Pets");
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.item[0].url().as_deref(), Some("https://api.test/pets"));
        assert_eq!(doc.item[1].method().as_deref(), Some("POST"));
        assert!(doc.extra.contains_key("variable"));
        assert!(doc.info.extra.contains_key("schema"));
    }

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let original = json!({
            "info": {"name": "A", "_postman_id": "123"},
            "item": [{"name": "i1", "event": [{"listen": "test"}]}],
            "auth": {"type": "bearer"}
        });

        let doc: CollectionDocument = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(serde_json::to_value(&doc).unwrap(), original);
    }

    #[test]
    fn test_bare_string_request() {
        let item: CollectionItem =
            serde_json::from_value(json!({"name": "ping", "request": "https://api.test/ping"}))
                .unwrap();
        assert_eq!(item.method().as_deref(), Some("GET"));
        assert_eq!(item.url().as_deref(), Some("https://api.test/ping"));
    }

    #[test]
    fn test_folder_has_no_request() {
        let item: CollectionItem =
            serde_json::from_value(json!({"name": "folder", "item": []})).unwrap();
        assert_eq!(item.name(), "folder");
        assert!(item.method().is_none());
        assert!(item.url().is_none());
    }

    #[test]
    fn test_parse_environment() {
        let env: EnvironmentDocument = serde_json::from_value(json!({
            "name": "staging",
            "values": [
                {"key": "baseUrl", "value": "https://staging.test"},
                {"key": "token", "value": "abc", "enabled": false}
            ]
        }))
        .unwrap();

        assert_eq!(env.name.as_deref(), Some("staging"));
        assert!(env.values[0].enabled);
        assert!(!env.values[1].enabled);
    }
}
