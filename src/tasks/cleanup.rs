//! Cache Purge Task
//!
//! Background task that periodically sweeps expired entries out of a
//! client's caches. Reads already skip dead entries; the sweep only bounds
//! memory held by entries nobody asks for again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::ClientCaches;

/// Spawns a background task that purges expired entries from `caches`.
///
/// # Arguments
/// * `caches` - Cache pair shared with the client
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, used to abort it on shutdown.
///
/// # Example
/// ```ignore
/// let client = SecretStoreClient::from_config(&config)?;
/// let cleanup_handle = spawn_cleanup_task(client.caches().clone(), 60);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(caches: ClientCaches, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting cache purge task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = caches.purge_expired();
            if removed > 0 {
                info!("Cache purge: removed {} expired entries", removed);
            } else {
                debug!("Cache purge: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DirectoryEntry;

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let caches = ClientCaches::new(Duration::from_secs(300), Duration::from_secs(300));
        caches
            .listings
            .set_with_ttl("list:/soon:root", Vec::new(), Duration::from_millis(500));

        let handle = spawn_cleanup_task(caches.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(caches.listings.len(), 0, "Expired entry should have been swept");
        assert_eq!(caches.stats().listings.expirations, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let caches = ClientCaches::new(Duration::from_secs(3600), Duration::from_secs(3600));
        let entries = vec![DirectoryEntry::new("db", "/app/db", false)];
        caches.listings.set("list:/app:root", entries.clone());

        let handle = spawn_cleanup_task(caches.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(caches.listings.get("list:/app:root"), Some(entries));

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let caches = ClientCaches::new(Duration::from_secs(60), Duration::from_secs(60));

        let handle = spawn_cleanup_task(caches, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
