//! Transport Module
//!
//! The request-sending collaborator the client talks through. A transport
//! reports "no response received" as an `Err`, and any received response,
//! whatever its status, as `Ok`.

mod http;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use http::HttpTransport;

/// Header carrying the bearer credential
pub const TOKEN_HEADER: &str = "X-Vault-Token";

/// Header carrying the namespace, when one is set
pub const NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// Header carrying the real verb when LIST is sent as POST
pub const METHOD_OVERRIDE_HEADER: &str = "X-HTTP-Method-Override";

// == Wire Method ==
/// Verbs used by the KV v2 protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireMethod {
    Get,
    Post,
    Delete,
    /// Non-standard verb for directory listings
    List,
}

impl WireMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireMethod::Get => "GET",
            WireMethod::Post => "POST",
            WireMethod::Delete => "DELETE",
            WireMethod::List => "LIST",
        }
    }
}

impl fmt::Display for WireMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Wire Request ==
/// A fully addressed request.
#[derive(Clone)]
pub struct WireRequest {
    pub method: WireMethod,
    /// Absolute URL
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// JSON body, if any
    pub body: Option<Value>,
}

impl WireRequest {
    pub fn new(method: WireMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Looks up a header value by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// Credentials must never reach logs
impl fmt::Debug for WireRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(n, v)| {
                if n.eq_ignore_ascii_case(TOKEN_HEADER) {
                    (n.as_str(), "[REDACTED]")
                } else {
                    (n.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("WireRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

// == Wire Response ==
/// A received response.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl WireResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

// == Transport Error ==
/// No response was received.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// == Transport Trait ==
/// Sends wire requests.
///
/// Implementations must be shareable across tasks; the client and every
/// concurrent search branch call through the same instance.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn send(&self, request: WireRequest) -> Result<WireResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_debug_redacts_token() {
        let request = WireRequest::new(WireMethod::Get, "http://vault.test/v1/sys/health")
            .header(TOKEN_HEADER, "s.very-secret")
            .header(NAMESPACE_HEADER, "team-a");

        let debug = format!("{:?}", request);
        assert!(!debug.contains("s.very-secret"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("team-a"));
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let request = WireRequest::new(WireMethod::Post, "http://x")
            .header("x-vault-namespace", "ns")
            .json(json!({}));
        assert_eq!(request.header_value(NAMESPACE_HEADER), Some("ns"));
        assert!(request.header_value(TOKEN_HEADER).is_none());
    }

    #[test]
    fn test_response_status_helpers() {
        assert!(WireResponse::new(204, Vec::new()).is_success());
        assert!(WireResponse::new(404, Vec::new()).is_not_found());
        assert!(!WireResponse::new(500, Vec::new()).is_success());
    }
}
