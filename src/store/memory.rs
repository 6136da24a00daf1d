use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::ItemStore;
use crate::item::Item;

/// HashMap-backed item store for tests and throwaway local runs
#[derive(Debug, Default)]
pub struct MemoryItemStore {
    items: RwLock<HashMap<String, Item>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet evicted
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    /// Reads the item at `path`, evicting it if it has expired
    async fn read(&self, path: &str) -> Result<Option<Item>> {
        let now = Utc::now();
        {
            let items = self.items.read().await;
            match items.get(path) {
                None => return Ok(None),
                Some(item) if !item.is_expired(now) => return Ok(Some(item.clone())),
                Some(_) => {}
            }
        }

        let mut items = self.items.write().await;
        if items.get(path).is_some_and(|item| item.is_expired(now)) {
            items.remove(path);
            tracing::debug!("Evicted expired item at {}", path);
        }
        Ok(None)
    }

    /// Stores `item` at `path`, sweeping every expired entry on the way
    async fn write(&self, path: &str, item: &Item) -> Result<()> {
        let now = Utc::now();
        let mut items = self.items.write().await;

        let before = items.len();
        items.retain(|_, stored| !stored.is_expired(now));
        let swept = before - items.len();
        if swept > 0 {
            tracing::debug!("Swept {} expired items", swept);
        }

        items.insert(path.to_string(), item.clone());
        tracing::debug!("Stored {} item at {}", item.type_name(), path);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.items.write().await.remove(path);
        tracing::debug!("Deleted item at {}", path);
        Ok(())
    }
}
