//! Connection descriptor and the cache pair injected into a client.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::cache::{CacheStats, TtlCache};
use crate::models::{DirectoryEntry, SecretValue};

/// Where and as whom a client connects.
///
/// URL and credential are fixed once the client is built; the namespace is
/// only the starting value and can be switched on the client afterwards.
#[derive(Clone)]
pub struct ConnectionDescriptor {
    /// Server address, without the `/v1` API prefix
    pub base_url: String,
    /// Bearer credential
    pub credential: String,
    pub namespace: Option<String>,
}

impl ConnectionDescriptor {
    pub fn new(base_url: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credential: credential.into(),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("base_url", &self.base_url)
            .field("credential", &"[REDACTED]")
            .field("namespace", &self.namespace)
            .finish()
    }
}

/// The listing and secret caches a client reads through.
///
/// Built by the caller and handed to the client, so each client (one per
/// connection) owns its own entries. Clones share the same caches.
#[derive(Debug, Clone)]
pub struct ClientCaches {
    pub listings: Arc<TtlCache<Vec<DirectoryEntry>>>,
    pub secrets: Arc<TtlCache<SecretValue>>,
}

impl ClientCaches {
    pub fn new(list_ttl: Duration, secret_ttl: Duration) -> Self {
        Self {
            listings: Arc::new(TtlCache::new(list_ttl)),
            secrets: Arc::new(TtlCache::new(secret_ttl)),
        }
    }

    /// Sweeps expired entries from both caches; returns the total removed.
    pub fn purge_expired(&self) -> usize {
        self.listings.purge_expired() + self.secrets.purge_expired()
    }

    /// Empties both caches.
    pub fn clear(&self) {
        self.listings.clear();
        self.secrets.clear();
    }

    pub fn stats(&self) -> ClientCacheStats {
        ClientCacheStats {
            listings: self.listings.stats(),
            secrets: self.secrets.stats(),
        }
    }
}

/// Counters for both caches of a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientCacheStats {
    pub listings: CacheStats,
    pub secrets: CacheStats,
}
