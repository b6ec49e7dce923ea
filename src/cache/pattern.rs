//! Key patterns for bulk invalidation.

use regex::Regex;

/// Selects a set of cache keys.
///
/// A plain string converts to an anchored prefix match.
#[derive(Debug, Clone)]
pub enum KeyPattern {
    /// Matches keys starting with the given text
    Prefix(String),
    /// Matches keys the expression finds a match in
    Regex(Regex),
}

impl KeyPattern {
    /// Returns true if `key` is selected by this pattern.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyPattern::Prefix(prefix) => key.starts_with(prefix.as_str()),
            KeyPattern::Regex(re) => re.is_match(key),
        }
    }
}

impl From<&str> for KeyPattern {
    fn from(prefix: &str) -> Self {
        KeyPattern::Prefix(prefix.to_string())
    }
}

impl From<String> for KeyPattern {
    fn from(prefix: String) -> Self {
        KeyPattern::Prefix(prefix)
    }
}

impl From<Regex> for KeyPattern {
    fn from(re: Regex) -> Self {
        KeyPattern::Regex(re)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_anchored() {
        let pattern = KeyPattern::from("list:/app");
        assert!(pattern.matches("list:/app:root"));
        assert!(pattern.matches("list:/app/db:root"));
        assert!(!pattern.matches("secret:list:/app:root"));
    }

    #[test]
    fn test_regex_pattern() {
        let pattern = KeyPattern::from(Regex::new(r":team-a$").unwrap());
        assert!(pattern.matches("secret:/db:team-a"));
        assert!(!pattern.matches("secret:/db:root"));
    }
}
