//! TTL Cleanup Task
//!
//! Background task that periodically removes expired entries from the
//! embedded backend.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::backend::MemoryBackend;

/// Spawns a background task that periodically cleans up expired entries.
///
/// Expired keys are already invisible to reads; the sweep only reclaims their
/// memory. The task loops until aborted.
///
/// # Arguments
/// * `backend` - shared reference to the embedded store
/// * `cleanup_interval_secs` - Interval in seconds between cleanup runs
///
/// # Example
/// ```ignore
/// let backend = Arc::new(MemoryBackend::new());
/// let cleanup_handle = spawn_cleanup_task(backend.clone(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(
    backend: Arc<MemoryBackend>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = backend.cleanup_expired().await;

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::KvBackend;

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set("expire_soon", b"value".to_vec(), Some(200))
            .await
            .unwrap();

        let handle = spawn_cleanup_task(backend.clone(), 1);

        // Wait for entry to expire and cleanup to run
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(backend.len().await, 0, "Expired entry should have been swept");

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set("long_lived", b"value".to_vec(), Some(3_600_000))
            .await
            .unwrap();
        backend.set("persistent", b"value".to_vec(), None).await.unwrap();

        let handle = spawn_cleanup_task(backend.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(backend.len().await, 2);
        assert_eq!(
            backend.get("long_lived").await.unwrap(),
            Some(b"value".to_vec())
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let backend = Arc::new(MemoryBackend::new());

        let handle = spawn_cleanup_task(backend, 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
