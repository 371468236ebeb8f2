use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::storage::traits::KeyValueStore;

/// In-memory key-value store standing in for the platform's durable local
/// storage. Clones share the same backing map.
#[derive(Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("key-value store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("key-value store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("key-value store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove_round_trip() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("preferences.theme").await.unwrap(), None);

        store.set("preferences.theme", "dark").await.unwrap();
        assert_eq!(
            store.get("preferences.theme").await.unwrap(),
            Some("dark".to_string())
        );

        store.remove("preferences.theme").await.unwrap();
        assert_eq!(store.get("preferences.theme").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clones_share_the_same_backing_map() {
        let store = MemoryKeyValueStore::new();
        let other = store.clone();
        store.set("auth.session", "{}").await.unwrap();
        assert_eq!(other.get("auth.session").await.unwrap(), Some("{}".to_string()));
    }
}
