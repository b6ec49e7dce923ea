//! Cache Module
//!
//! Provides in-memory caching with per-entry TTL expiration and
//! pattern-based bulk invalidation.

mod entry;
mod pattern;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use pattern::KeyPattern;
pub use stats::CacheStats;
pub use store::TtlCache;
