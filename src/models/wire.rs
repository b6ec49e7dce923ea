//! KV v2 wire envelopes
//!
//! Request and response bodies exchanged with the secret store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SecretMetadata;

/// Engine types treated as key-value mounts
const KV_ENGINE_TYPES: &[&str] = &["kv", "generic"];

/// Body of `GET /<mount>/data/<path>`
#[derive(Debug, Deserialize)]
pub struct ReadEnvelope {
    pub data: ReadData,
}

#[derive(Debug, Deserialize)]
pub struct ReadData {
    /// Null when the current version was deleted
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(default)]
    pub metadata: Option<SecretMetadata>,
}

/// Body of `LIST /<mount>/metadata/<path>`
#[derive(Debug, Deserialize)]
pub struct ListEnvelope {
    pub data: ListData,
}

#[derive(Debug, Deserialize)]
pub struct ListData {
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Body of `POST /<mount>/data/<path>`
#[derive(Debug, Serialize)]
pub struct WriteRequest<'a> {
    pub data: &'a Map<String, Value>,
}

/// Error body returned with non-success statuses
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ErrorBody {
    /// Extracts the server's error list from a raw body, if it has one.
    pub fn errors_from(body: &[u8]) -> Vec<String> {
        serde_json::from_slice::<ErrorBody>(body)
            .map(|b| b.errors)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct MountInfo {
    #[serde(rename = "type")]
    engine_type: String,
}

/// Names of key-value mounts in a `GET /sys/mounts` body.
///
/// Newer servers nest the table under `data`; older ones return it at the
/// top level alongside request fields, which simply fail to parse as mounts.
pub fn kv_mounts(body: &Value) -> Vec<String> {
    let table = match body.get("data").and_then(Value::as_object) {
        Some(data) => data,
        None => match body.as_object() {
            Some(top) => top,
            None => return Vec::new(),
        },
    };

    let mut mounts: Vec<String> = table
        .iter()
        .filter_map(|(name, info)| {
            let info: MountInfo = serde_json::from_value(info.clone()).ok()?;
            KV_ENGINE_TYPES
                .contains(&info.engine_type.as_str())
                .then(|| name.trim_end_matches('/').to_string())
        })
        .collect();
    mounts.sort();
    mounts.dedup();
    mounts
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_envelope_deleted_version() {
        let envelope: ReadEnvelope = serde_json::from_value(json!({
            "data": { "data": null, "metadata": { "version": 3, "destroyed": false } }
        }))
        .unwrap();

        assert!(envelope.data.data.is_none());
        assert_eq!(envelope.data.metadata.unwrap().version, 3);
    }

    #[test]
    fn test_errors_from_body() {
        assert_eq!(
            ErrorBody::errors_from(br#"{"errors":["permission denied"]}"#),
            vec!["permission denied".to_string()]
        );
        assert!(ErrorBody::errors_from(b"<html>bad gateway</html>").is_empty());
    }

    #[test]
    fn test_kv_mounts_filters_engines() {
        let body = json!({
            "request_id": "abc",
            "data": {
                "secret/": { "type": "kv", "options": { "version": "2" } },
                "legacy/": { "type": "generic" },
                "sys/": { "type": "system" },
                "pki/": { "type": "pki" }
            }
        });

        assert_eq!(kv_mounts(&body), vec!["legacy".to_string(), "secret".to_string()]);
    }

    #[test]
    fn test_kv_mounts_top_level_table() {
        let body = json!({
            "lease_id": "",
            "kv/": { "type": "kv" },
            "cubbyhole/": { "type": "cubbyhole" }
        });

        assert_eq!(kv_mounts(&body), vec!["kv".to_string()]);
    }
}
