//! vault-kv - A caching client for KV v2 secret stores
//!
//! Translates path-based list/read/write/delete/search operations into KV v2
//! wire calls, caching listings and secret values with independent TTLs and
//! keeping both caches coherent across writes, deletes and namespace switches.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod path;
pub mod search;
pub mod tasks;
pub mod transport;

pub use client::{ClientCaches, ConnectionDescriptor, SecretStoreClient};
pub use config::Config;
pub use error::{Result, VaultError};
pub use search::{SearchEngine, SearchOptions, SearchResults};
pub use tasks::spawn_cleanup_task;
