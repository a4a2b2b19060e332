use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::Store;
use crate::Result;

/// Process-local store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put(&self, key: &str, blob: Bytes) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), blob);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.entries.read().await.get(key).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_upserts() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);

        store.put("u", Bytes::from_static(b"1")).await.unwrap();
        store.put("u", Bytes::from_static(b"2")).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("u").await.unwrap(), Some(Bytes::from_static(b"2")));
        assert!(!store.contains("missing").await.unwrap());
    }
}
