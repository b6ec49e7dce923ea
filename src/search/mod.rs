//! Search Module
//!
//! Recursive name and content search over the secret tree.
//!
//! Each folder's children are visited concurrently and awaited together.
//! Listings and reads go through the client, so they share its caches with
//! ordinary calls. A semaphore bounds in-flight wire calls per engine, and a
//! caller-supplied [`CancellationToken`] stops the walk between calls.

mod types;

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::SecretStoreClient;
use crate::models::DirectoryEntry;

pub use types::{
    MatchKind, SearchMatch, SearchOptions, SearchResults, DEFAULT_MAX_DEPTH, DEFAULT_MAX_RESULTS,
    DEFAULT_SEARCH_CONCURRENCY,
};

// == Search Engine ==
/// Walks the tree below a base path looking for a case-insensitive substring.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    client: Arc<SecretStoreClient>,
    permits: Arc<Semaphore>,
}

impl SearchEngine {
    /// Creates an engine over `client`.
    ///
    /// # Arguments
    /// * `client` - Client whose caches and connection the search uses
    /// * `concurrency` - Maximum in-flight wire calls; zero is treated as one
    pub fn new(client: Arc<SecretStoreClient>, concurrency: usize) -> Self {
        Self {
            client,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    // == Search ==
    /// Finds entries whose name, or whose serialized data for leaves,
    /// contains `query`.
    ///
    /// Never fails: a path that cannot be listed or read is logged and
    /// skipped. Once `token` fires no further calls are issued and results
    /// still in flight are dropped.
    pub async fn search(
        &self,
        query: &str,
        options: SearchOptions,
        token: &CancellationToken,
    ) -> SearchResults {
        if query.trim().is_empty() || token.is_cancelled() {
            return SearchResults {
                cancelled: token.is_cancelled(),
                ..SearchResults::default()
            };
        }

        debug!(query = %query, base = %options.base_path, "Starting search");
        let state = SearchState::new(query.to_lowercase(), options, token.clone());
        let base = state.options.base_path.clone();
        self.walk(&state, base, 0).await;

        let results = state.finish();
        info!(
            matches = results.matches.len(),
            cancelled = results.cancelled,
            truncated = results.truncated,
            "Search finished"
        );
        results
    }

    /// Lists `path` and visits its children. `depth` is the level of `path`
    /// itself, so its children sit at `depth + 1`.
    fn walk<'a>(&'a self, state: &'a SearchState, path: String, depth: usize) -> BoxFuture<'a, ()> {
        async move {
            if state.should_stop() || depth >= state.options.max_depth {
                return;
            }

            let entries = match self.throttled(&state.token, self.client.list_secrets(&path)).await {
                None => return,
                Some(Ok(entries)) => entries,
                Some(Err(e)) => {
                    warn!(path = %path, error = %e, "Skipping folder that could not be listed");
                    return;
                }
            };
            if state.should_stop() {
                return;
            }

            let branches: Vec<_> = entries
                .into_iter()
                .filter(|entry| state.mark_visited(&entry.path))
                .map(|entry| self.visit(state, entry, depth + 1))
                .collect();
            join_all(branches).await;
        }
        .boxed()
    }

    async fn visit(&self, state: &SearchState, entry: DirectoryEntry, depth: usize) {
        if state.should_stop() {
            return;
        }

        let name_matched = entry.name.to_lowercase().contains(&state.query);
        if name_matched {
            state.record(&entry, MatchKind::Name, depth);
        }

        if entry.is_folder {
            self.walk(state, entry.path, depth).await;
            return;
        }
        if name_matched || state.should_stop() {
            return;
        }

        match self.throttled(&state.token, self.client.read_secret(&entry.path)).await {
            None => {}
            Some(Ok(secret)) => {
                if secret.data_json().to_lowercase().contains(&state.query) {
                    state.record(&entry, MatchKind::Content, depth);
                }
            }
            Some(Err(e)) => {
                warn!(path = %entry.path, error = %e, "Skipping secret that could not be read");
            }
        }
    }

    /// Runs `call` under a permit. Returns `None` if the token fires first.
    async fn throttled<F, T>(&self, token: &CancellationToken, call: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let _permit = tokio::select! {
            _ = token.cancelled() => return None,
            permit = self.permits.acquire() => permit.ok()?,
        };
        if token.is_cancelled() {
            return None;
        }
        Some(call.await)
    }
}

// == Search State ==
/// Per-search bookkeeping shared by every branch.
struct SearchState {
    query: String,
    options: SearchOptions,
    token: CancellationToken,
    visited: Mutex<HashSet<String>>,
    results: Mutex<Accumulator>,
}

#[derive(Default)]
struct Accumulator {
    matches: Vec<SearchMatch>,
    recorded: HashSet<String>,
    truncated: bool,
}

impl SearchState {
    fn new(query: String, options: SearchOptions, token: CancellationToken) -> Self {
        Self {
            query,
            options,
            token,
            visited: Mutex::new(HashSet::new()),
            results: Mutex::new(Accumulator::default()),
        }
    }

    /// True once cancelled or once the result cap is reached.
    fn should_stop(&self) -> bool {
        if self.token.is_cancelled() {
            return true;
        }
        let mut results = self.results.lock();
        if results.matches.len() >= self.options.max_results {
            results.truncated = true;
            return true;
        }
        false
    }

    /// Returns true if `path` had not been seen before.
    fn mark_visited(&self, path: &str) -> bool {
        self.visited.lock().insert(path.to_string())
    }

    fn record(&self, entry: &DirectoryEntry, kind: MatchKind, depth: usize) {
        if self.token.is_cancelled() {
            return;
        }
        let mut results = self.results.lock();
        if results.recorded.contains(&entry.path) {
            return;
        }
        if results.matches.len() >= self.options.max_results {
            results.truncated = true;
            return;
        }
        results.recorded.insert(entry.path.clone());
        results.matches.push(SearchMatch {
            path: entry.path.clone(),
            name: entry.name.clone(),
            is_folder: entry.is_folder,
            kind,
            depth,
        });
    }

    fn finish(self) -> SearchResults {
        let mut results = self.results.into_inner();
        if results.matches.len() > self.options.max_results {
            results.matches.truncate(self.options.max_results);
            results.truncated = true;
        }
        SearchResults {
            matches: results.matches,
            cancelled: self.token.is_cancelled(),
            truncated: results.truncated,
        }
    }
}
