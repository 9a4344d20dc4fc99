//! Content digest of a raw schema document.
//!
//! The store is keyed by this digest: a schema swap that changes the
//! document changes the digest, which discards and recreates the store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

const DIGEST_PREFIX: &str = "fs1_";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaDigest(String);

impl SchemaDigest {
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn sort_json_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            let mut sorted = Map::new();
            for key in keys {
                if let Some(item) = map.get(key) {
                    sorted.insert(key.clone(), sort_json_value(item));
                }
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_json_value).collect()),
        _ => value.clone(),
    }
}

/// SHA-256 over the canonical (key-sorted, compact) JSON rendering.
pub fn schema_digest(raw: &Value) -> SchemaDigest {
    let canonical = sort_json_value(raw);
    let mut hasher = Sha256::new();
    // Rendering a `Value` cannot fail; its Display is compact JSON.
    hasher.update(canonical.to_string().as_bytes());
    SchemaDigest(format!("{DIGEST_PREFIX}{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn digest_ignores_key_order() {
        let a = json!({"name": "web", "tabs": [{"label": "L", "name": "n"}]});
        let b = json!({"tabs": [{"name": "n", "label": "L"}], "name": "web"});
        assert_eq!(schema_digest(&a), schema_digest(&b));
    }

    #[test]
    fn digest_tracks_content_and_order_of_arrays() {
        let a = json!({"tabs": [{"name": "a"}, {"name": "b"}]});
        let b = json!({"tabs": [{"name": "b"}, {"name": "a"}]});
        assert_ne!(schema_digest(&a), schema_digest(&b));
        assert!(schema_digest(&a).as_str().starts_with("fs1_"));
        assert_eq!(schema_digest(&a).as_str().len(), 4 + 64);
    }
}
