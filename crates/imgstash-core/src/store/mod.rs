//! Persistent key-value store for preloaded image bytes.
//!
//! Entries are keyed by URL and hold the raw response body. Writes are
//! upserts: a later `put` for the same URL replaces the earlier blob. There is
//! no expiry and no eviction.
//!
//! ## Key Types
//!
//! - [`Store`]: the narrow interface the preload worker writes through
//! - [`DiskStore`]: durable store rooted in a directory
//! - [`MemoryStore`]: process-local store for memory-only sessions
//!
//! ## Example
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use imgstash_core::store::{DiskStore, Store};
//!
//! # async fn example() -> imgstash_core::Result<()> {
//! let store = DiskStore::open("/tmp/cache-root").await?;
//! store.put("https://example.com/a.jpg", Bytes::from_static(b"jpeg")).await?;
//! assert!(store.contains("https://example.com/a.jpg").await?);
//! # Ok(())
//! # }
//! ```

mod disk;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::Result;
use crate::config::StoreConfig;

pub use disk::{DiskStore, EntryKey, StoreManifest};
pub use memory::MemoryStore;

/// Durable mapping from URL to an opaque binary blob.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or replace the blob stored under `key`.
    async fn put(&self, key: &str, blob: Bytes) -> Result<()>;

    /// Read the blob stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Whether an entry exists for `key`.
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Open the configured store, degrading to `None` when it is unavailable.
///
/// A store that cannot be opened is not an error for the preloader: it logs
/// the failure and the session carries on without persistence.
pub async fn open_store(config: &StoreConfig) -> Option<Arc<dyn Store>> {
    if !config.enabled {
        debug!("Persistent store disabled by configuration");
        return None;
    }

    match DiskStore::open(&config.root).await {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!(
                category = e.category(),
                "Image store unavailable at {}, preloading without persistence: {}",
                config.root.display(),
                e
            );
            None
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_store_disabled_returns_none() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig {
            enabled: false,
            root: temp.path().to_path_buf(),
        };
        assert!(open_store(&config).await.is_none());
    }

    #[tokio::test]
    async fn test_open_store_unavailable_returns_none() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, b"file in the way").unwrap();

        let config = StoreConfig {
            enabled: true,
            root: blocker,
        };
        assert!(open_store(&config).await.is_none());
    }

    #[tokio::test]
    async fn test_open_store_returns_usable_handle() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig {
            enabled: true,
            root: PathBuf::from(temp.path()),
        };

        let store = open_store(&config).await.unwrap();
        store
            .put("https://example.com/x.png", Bytes::from_static(b"png"))
            .await
            .unwrap();
        assert!(store.contains("https://example.com/x.png").await.unwrap());
    }
}
