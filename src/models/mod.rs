//! Data models for the secret-store client
//!
//! `secret` holds the domain types handed to callers; `wire` holds the KV v2
//! request and response envelopes.

pub mod secret;
pub mod wire;

// Re-export commonly used types
pub use secret::{ConnectionStatus, DirectoryEntry, SecretMetadata, SecretValue};
