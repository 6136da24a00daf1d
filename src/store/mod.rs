pub mod memory;
pub mod spanner;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::StorageConfig;
use crate::item::Item;

pub use memory::MemoryItemStore;
pub use spanner::SpannerItemStore;

/// Point-addressed item storage keyed by path
///
/// Keys are compared exactly as given; callers lowercase before reading.
/// Implementations honor `Item::validity` as an expiry hint and never return
/// an item past its expiry.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Look up the item stored at exactly `path`
    async fn read(&self, path: &str) -> Result<Option<Item>>;

    /// Store `item` at `path`, replacing anything already there
    async fn write(&self, path: &str, item: &Item) -> Result<()>;

    /// Remove the item at `path`; removing an absent path is not an error
    async fn delete(&self, path: &str) -> Result<()>;

    /// Verify the backend is reachable
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Open the backend selected by configuration
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn ItemStore>> {
    match config {
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory item store; items are lost on restart");
            Ok(Arc::new(MemoryItemStore::new()))
        }
        StorageConfig::Spanner(spanner) => {
            Ok(Arc::new(SpannerItemStore::from_config(spanner).await?))
        }
    }
}
