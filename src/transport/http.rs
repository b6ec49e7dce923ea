//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::debug;

use super::{
    Transport, TransportError, WireMethod, WireRequest, WireResponse, METHOD_OVERRIDE_HEADER,
};
use crate::error::{Result, VaultError};

/// HTTP transport using a pooled `reqwest` client.
///
/// LIST is sent as a native extension verb by default. With `method_override`
/// enabled it is sent as POST carrying `X-HTTP-Method-Override: LIST`, for
/// proxies that reject unknown verbs.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    method_override: bool,
}

impl HttpTransport {
    /// Builds a transport with the given per-request timeout.
    pub fn new(timeout: Duration, method_override: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VaultError::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            method_override,
        })
    }

    fn resolve_method(
        &self,
        method: WireMethod,
    ) -> std::result::Result<(Method, Option<&'static str>), TransportError> {
        let resolved = match method {
            WireMethod::Get => (Method::GET, None),
            WireMethod::Post => (Method::POST, None),
            WireMethod::Delete => (Method::DELETE, None),
            WireMethod::List if self.method_override => (Method::POST, Some("LIST")),
            WireMethod::List => (
                Method::from_bytes(b"LIST").map_err(|e| TransportError::new(e.to_string()))?,
                None,
            ),
        };
        Ok(resolved)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: WireRequest) -> std::result::Result<WireResponse, TransportError> {
        let (method, override_verb) = self.resolve_method(request.method)?;
        debug!(method = %method, url = %request.url, "Sending request");

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(verb) = override_verb {
            builder = builder.header(METHOD_OVERRIDE_HEADER, verb);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        debug!(status, bytes = body.len(), "Received response");
        Ok(WireResponse::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_uses_native_verb() {
        let transport = HttpTransport::new(Duration::from_secs(5), false).unwrap();
        let (method, header) = transport.resolve_method(WireMethod::List).unwrap();
        assert_eq!(method.as_str(), "LIST");
        assert!(header.is_none());
    }

    #[test]
    fn test_list_with_method_override() {
        let transport = HttpTransport::new(Duration::from_secs(5), true).unwrap();
        let (method, header) = transport.resolve_method(WireMethod::List).unwrap();
        assert_eq!(method, Method::POST);
        assert_eq!(header, Some("LIST"));

        let (method, header) = transport.resolve_method(WireMethod::Delete).unwrap();
        assert_eq!(method, Method::DELETE);
        assert!(header.is_none());
    }
}
