//! In-memory transport for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::{Transport, TransportError, WireMethod, WireRequest, WireResponse};

pub(crate) const TEST_BASE_URL: &str = "http://vault.test";

#[derive(Debug, Clone)]
enum Reply {
    Respond(WireResponse),
    Fail(String),
}

/// Scripted transport. Unrouted requests get a 404 with an empty error list.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    routes: Mutex<HashMap<(WireMethod, String), Reply>>,
    calls: Mutex<Vec<WireRequest>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before answering.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn url(path: &str) -> String {
        format!("{}/v1{}", TEST_BASE_URL, path)
    }

    pub(crate) fn respond(&self, method: WireMethod, path: &str, status: u16, body: Value) {
        let response = WireResponse::new(status, body.to_string().into_bytes());
        self.routes
            .lock()
            .insert((method, Self::url(path)), Reply::Respond(response));
    }

    pub(crate) fn fail(&self, method: WireMethod, path: &str, message: &str) {
        self.routes
            .lock()
            .insert((method, Self::url(path)), Reply::Fail(message.to_string()));
    }

    /// Serves `tree` under `mount`: objects holding any object are folders,
    /// every other object is a secret's data.
    pub(crate) fn serve_tree(&self, mount: &str, tree: &Value) {
        self.serve_folder(mount, "", tree);
    }

    fn serve_folder(&self, mount: &str, prefix: &str, folder: &Value) {
        let Some(children) = folder.as_object() else {
            return;
        };

        let mut keys = Vec::new();
        for (name, child) in children {
            let child_path = format!("{}/{}", prefix, name);
            if is_folder(child) {
                keys.push(format!("{}/", name));
                self.serve_folder(mount, &child_path, child);
            } else {
                keys.push(name.clone());
                self.respond(
                    WireMethod::Get,
                    &format!("/{}/data{}", mount, child_path),
                    200,
                    json!({ "data": { "data": child, "metadata": { "version": 1 } } }),
                );
            }
        }
        self.respond(
            WireMethod::List,
            &format!("/{}/metadata{}/", mount, prefix),
            200,
            json!({ "data": { "keys": keys } }),
        );
    }

    pub(crate) fn calls(&self) -> Vec<WireRequest> {
        self.calls.lock().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of calls made with `method` to `path`.
    pub(crate) fn count(&self, method: WireMethod, path: &str) -> usize {
        let url = Self::url(path);
        self.calls
            .lock()
            .iter()
            .filter(|c| c.method == method && c.url == url)
            .count()
    }

    /// Highest number of calls that were awaiting a reply at once.
    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

fn is_folder(node: &Value) -> bool {
    node.as_object()
        .map(|o| o.values().any(Value::is_object))
        .unwrap_or(false)
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        let reply = self
            .routes
            .lock()
            .get(&(request.method, request.url.clone()))
            .cloned();
        self.calls.lock().push(request);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(TransportError::new(message)),
            None => Ok(WireResponse::new(404, br#"{"errors":[]}"#.to_vec())),
        }
    }
}
