//! Domain types returned by the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Version metadata attached to a secret read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretMetadata {
    /// When this version was written
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub created_time: Option<DateTime<Utc>>,
    /// When this version was soft-deleted, if it was
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub deletion_time: Option<DateTime<Utc>>,
    /// Whether the version's data was permanently destroyed
    #[serde(default)]
    pub destroyed: bool,
    /// Version number
    #[serde(default)]
    pub version: u64,
}

/// Accepts RFC 3339 strings, treating `null` and `""` as absent.
fn deserialize_optional_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(text) => DateTime::parse_from_rfc3339(text)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
    }
}

/// A secret as returned by a read.
///
/// Values handed out are clones of the cached copy, so callers cannot push
/// changes back into the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretValue {
    /// Logical path the secret was read from
    pub path: String,
    /// Current key/value data
    pub data: Map<String, Value>,
    /// Version metadata, when the server returned it
    pub metadata: Option<SecretMetadata>,
}

impl SecretValue {
    /// Serialized form of `data`, used for content search.
    pub fn data_json(&self) -> String {
        Value::Object(self.data.clone()).to_string()
    }
}

/// One child of a listed folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Segment name, without trailing separator
    pub name: String,
    /// Full logical path of the child
    pub path: String,
    /// True when the wire key ended with a separator
    pub is_folder: bool,
}

impl DirectoryEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>, is_folder: bool) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_folder,
        }
    }
}

/// Outcome of a connectivity probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionStatus {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionStatus {
    /// A reachable, usable server.
    pub fn healthy() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    /// An unreachable or unusable server, with the reason.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}
