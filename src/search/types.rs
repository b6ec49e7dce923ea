//! Search inputs and outputs.

use serde::Serialize;

/// Default cap on returned matches
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Default traversal depth below the base path
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default bound on in-flight wire calls per engine
pub const DEFAULT_SEARCH_CONCURRENCY: usize = 8;

/// Bounds for one search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Folder the walk starts from; empty for the mount root
    pub base_path: String,
    /// Hard cap on returned matches
    pub max_results: usize,
    /// Deepest entry level reported; direct children of the base are depth 1
    pub max_depth: usize,
}

impl SearchOptions {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            max_results: DEFAULT_MAX_RESULTS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// What part of an entry matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Name,
    Content,
}

/// One hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMatch {
    pub path: String,
    pub name: String,
    pub is_folder: bool,
    pub kind: MatchKind,
    /// Levels below the base path
    pub depth: usize,
}

/// Matches found, in completion order across branches.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub matches: Vec<SearchMatch>,
    /// The token fired before the walk finished
    pub cancelled: bool,
    /// The result cap stopped the walk, so further matches may exist
    pub truncated: bool,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.path.as_str()).collect()
    }
}
