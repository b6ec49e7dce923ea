//! Secret Store Client
//!
//! The public operation surface. Every call canonicalizes its path, consults
//! the listing or secret cache, and on a miss issues the KV v2 wire call and
//! caches the result.
//!
//! # Coherence
//! A write or delete of `p` invalidates exactly two entries: the secret entry
//! for `p` and the listing entry for `parent_of(p)`. A namespace switch clears
//! both caches.

mod connection;

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, VaultError};
use crate::models::wire::{kv_mounts, ErrorBody, ListEnvelope, ReadEnvelope, WriteRequest};
use crate::models::{ConnectionStatus, DirectoryEntry, SecretValue};
use crate::path::{self, CacheKind};
use crate::transport::{
    HttpTransport, Transport, WireMethod, WireRequest, WireResponse, NAMESPACE_HEADER,
    TOKEN_HEADER,
};

pub use connection::{ClientCacheStats, ClientCaches, ConnectionDescriptor};

/// Health statuses reported by standby nodes, which still serve reads
const STANDBY_STATUSES: &[u16] = &[429, 472, 473];

// == Secret Store Client ==
/// Caching client for one KV v2 mount.
///
/// Safe to share behind an `Arc`; the namespace and both caches are
/// internally synchronized.
pub struct SecretStoreClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    credential: String,
    namespace: RwLock<Option<String>>,
    mount: String,
    caches: ClientCaches,
}

impl fmt::Debug for SecretStoreClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretStoreClient")
            .field("base_url", &self.base_url)
            .field("mount", &self.mount)
            .field("namespace", &*self.namespace.read())
            .finish_non_exhaustive()
    }
}

impl SecretStoreClient {
    // == Constructors ==
    /// Creates a client over an explicit transport and cache pair.
    ///
    /// # Arguments
    /// * `connection` - Address, credential and starting namespace
    /// * `mount` - KV v2 mount every path is resolved under
    /// * `transport` - Request sender
    /// * `caches` - Listing and secret caches owned by this client
    pub fn new(
        connection: ConnectionDescriptor,
        mount: impl Into<String>,
        transport: Arc<dyn Transport>,
        caches: ClientCaches,
    ) -> Self {
        let mount = mount.into().trim_matches('/').to_string();
        Self {
            transport,
            base_url: connection.base_url.trim_end_matches('/').to_string(),
            credential: connection.credential,
            namespace: RwLock::new(connection.namespace.filter(|ns| !ns.is_empty())),
            mount,
            caches,
        }
    }

    /// Creates a client with an HTTP transport and fresh caches from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(config.request_timeout(), config.method_override)?;
        let mut connection = ConnectionDescriptor::new(&config.address, &config.token);
        connection.namespace = config.namespace.clone();
        let caches = ClientCaches::new(config.list_cache_ttl(), config.secret_cache_ttl());

        Ok(Self::new(
            connection,
            &config.mount,
            Arc::new(transport),
            caches,
        ))
    }

    // == Accessors ==
    pub fn namespace(&self) -> Option<String> {
        self.namespace.read().clone()
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    pub fn caches(&self) -> &ClientCaches {
        &self.caches
    }

    pub fn cache_stats(&self) -> ClientCacheStats {
        self.caches.stats()
    }

    // == Namespace ==
    /// Switches the namespace used by every later call and clears both caches.
    ///
    /// `None` or an empty string selects the root namespace.
    pub fn set_namespace(&self, namespace: Option<String>) {
        let namespace = namespace.filter(|ns| !ns.is_empty());
        {
            let mut current = self.namespace.write();
            *current = namespace.clone();
            self.caches.clear();
        }
        info!(namespace = ?namespace, "Switched namespace, caches cleared");
    }

    /// Drops every cached listing and secret.
    pub fn clear_caches(&self) {
        self.caches.clear();
        debug!("Cleared client caches");
    }

    /// Sweeps expired entries from both caches; returns the number removed.
    pub fn purge_expired(&self) -> usize {
        self.caches.purge_expired()
    }

    // == Test Connection ==
    /// Probes `sys/health`. Never fails: problems are reported in the result.
    pub async fn test_connection(&self) -> ConnectionStatus {
        let namespace = self.namespace();
        let request = self.request(WireMethod::Get, "/sys/health", namespace.as_deref());

        match self.transport.send(request).await {
            Err(e) => ConnectionStatus::failed(e.message),
            Ok(response) if response.is_success() => ConnectionStatus::healthy(),
            Ok(response) if STANDBY_STATUSES.contains(&response.status) => {
                ConnectionStatus::healthy()
            }
            Ok(response) if response.status == 501 => {
                ConnectionStatus::failed("Server is not initialized")
            }
            Ok(response) if response.status == 503 => ConnectionStatus::failed("Server is sealed"),
            Ok(response) => ConnectionStatus::failed(protocol_error(&response).to_string()),
        }
    }

    // == List Secrets ==
    /// Lists the children of `path`.
    ///
    /// A path the server does not know is an empty folder: a not-found
    /// response yields an empty list, which is cached like any other.
    pub async fn list_secrets(&self, path: &str) -> Result<Vec<DirectoryEntry>> {
        let path = self.resolve(path);
        // Read before the namespace so a switch in between rejects the write-back
        let generation = self.caches.listings.generation();
        let namespace = self.namespace();
        let key = path::cache_key(CacheKind::List, &path, namespace.as_deref());

        if let Some(entries) = self.caches.listings.get(&key) {
            debug!(key = %key, "Cache hit for listing");
            return Ok(entries);
        }
        debug!(key = %key, "Cache miss, listing from server");

        let url = path::build_list_url(&path, &self.mount);
        let response = self
            .send(self.request(WireMethod::List, &url, namespace.as_deref()))
            .await?;

        let entries = if response.is_not_found() {
            Vec::new()
        } else if response.is_success() {
            let envelope: ListEnvelope = response.json()?;
            envelope
                .data
                .keys
                .iter()
                .filter_map(|key| directory_entry(&path, key))
                .collect()
        } else {
            return Err(protocol_error(&response));
        };

        self.caches
            .listings
            .set_if_generation(key, entries.clone(), generation);
        Ok(entries)
    }

    // == Read Secret ==
    /// Reads the current version of the secret at `path`.
    pub async fn read_secret(&self, path: &str) -> Result<SecretValue> {
        let path = self.resolve_secret_path(path)?;
        let generation = self.caches.secrets.generation();
        let namespace = self.namespace();
        let key = path::cache_key(CacheKind::Secret, &path, namespace.as_deref());

        if let Some(secret) = self.caches.secrets.get(&key) {
            debug!(key = %key, "Cache hit for secret");
            return Ok(secret);
        }
        debug!(key = %key, "Cache miss, reading from server");

        let url = path::build_data_url(&path, &self.mount);
        let response = self
            .send(self.request(WireMethod::Get, &url, namespace.as_deref()))
            .await?;

        if response.is_not_found() {
            return Err(VaultError::not_found(path));
        }
        if !response.is_success() {
            return Err(protocol_error(&response));
        }

        let envelope: ReadEnvelope = response.json()?;
        let secret = SecretValue {
            path,
            data: envelope.data.data.unwrap_or_default(),
            metadata: envelope.data.metadata,
        };

        self.caches
            .secrets
            .set_if_generation(key, secret.clone(), generation);
        Ok(secret)
    }

    // == Write Secret ==
    /// Writes `data` as a new version of the secret at `path`.
    pub async fn write_secret(&self, path: &str, data: Map<String, Value>) -> Result<()> {
        let path = self.resolve_secret_path(path)?;
        let namespace = self.namespace();
        let url = path::build_data_url(&path, &self.mount);
        let body = serde_json::to_value(WriteRequest { data: &data })?;

        let response = self
            .send(
                self.request(WireMethod::Post, &url, namespace.as_deref())
                    .json(body),
            )
            .await?;
        self.check_mutation(&response, &path)?;

        self.invalidate_after_mutation(&path, namespace.as_deref());
        info!(path = %path, "Wrote secret");
        Ok(())
    }

    /// Writes caller-serialized JSON. The text must be a JSON object; anything
    /// else is rejected before a request is made.
    pub async fn write_secret_json(&self, path: &str, raw: &str) -> Result<()> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| VaultError::validation(format!("Secret data is not valid JSON: {}", e)))?;
        match value {
            Value::Object(data) => self.write_secret(path, data).await,
            _ => Err(VaultError::validation("Secret data must be a JSON object")),
        }
    }

    // == Delete Secret ==
    /// Deletes every version and the metadata of the secret at `path`.
    pub async fn delete_secret(&self, path: &str) -> Result<()> {
        let path = self.resolve_secret_path(path)?;
        let namespace = self.namespace();
        let url = path::build_metadata_url(&path, &self.mount);

        let response = self
            .send(self.request(WireMethod::Delete, &url, namespace.as_deref()))
            .await?;
        self.check_mutation(&response, &path)?;

        self.invalidate_after_mutation(&path, namespace.as_deref());
        info!(path = %path, "Deleted secret");
        Ok(())
    }

    // == List Mounts ==
    /// Names of the key-value mounts visible to the credential, sorted.
    pub async fn list_mounts(&self) -> Result<Vec<String>> {
        let namespace = self.namespace();
        let response = self
            .send(self.request(WireMethod::Get, "/sys/mounts", namespace.as_deref()))
            .await?;
        if !response.is_success() {
            return Err(protocol_error(&response));
        }

        let body: Value = response.json()?;
        Ok(kv_mounts(&body))
    }

    // == Helpers ==
    /// Canonical logical path with any leading mount segment removed.
    fn resolve(&self, path: &str) -> String {
        path::canonicalize(&path::strip_mount_prefix(path, &self.mount))
    }

    fn resolve_secret_path(&self, path: &str) -> Result<String> {
        let resolved = self.resolve(path);
        if resolved.is_empty() {
            return Err(VaultError::validation("Secret path must not be empty"));
        }
        Ok(resolved)
    }

    fn request(&self, method: WireMethod, wire_path: &str, namespace: Option<&str>) -> WireRequest {
        let request = WireRequest::new(method, format!("{}/v1{}", self.base_url, wire_path))
            .header(TOKEN_HEADER, &self.credential);
        match namespace {
            Some(ns) => request.header(NAMESPACE_HEADER, ns),
            None => request,
        }
    }

    async fn send(&self, request: WireRequest) -> Result<WireResponse> {
        debug!(method = %request.method, url = %request.url, "Issuing wire call");
        self.transport
            .send(request)
            .await
            .map_err(|e| VaultError::transport(e.message))
    }

    fn check_mutation(&self, response: &WireResponse, path: &str) -> Result<()> {
        if response.is_success() {
            Ok(())
        } else if response.is_not_found() {
            Err(VaultError::not_found(path))
        } else {
            Err(protocol_error(response))
        }
    }

    fn invalidate_after_mutation(&self, path: &str, namespace: Option<&str>) {
        let secret_key = path::cache_key(CacheKind::Secret, path, namespace);
        let listing_key = path::cache_key(CacheKind::List, &path::parent_of(path), namespace);
        self.caches.secrets.invalidate(&secret_key);
        self.caches.listings.invalidate(&listing_key);
        debug!(secret = %secret_key, listing = %listing_key, "Invalidated after mutation");
    }
}

/// Builds the entry for one listed key; folders carry a trailing separator.
fn directory_entry(parent: &str, key: &str) -> Option<DirectoryEntry> {
    let is_folder = key.ends_with('/');
    let name = key.trim_end_matches('/');
    if name.is_empty() {
        return None;
    }
    let child_path = path::canonicalize(&path::join([parent, name]));
    Some(DirectoryEntry::new(path::base_name(&child_path), child_path, is_folder))
}

fn protocol_error(response: &WireResponse) -> VaultError {
    VaultError::protocol(response.status, ErrorBody::errors_from(&response.body))
}
