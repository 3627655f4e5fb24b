//! # Machine Type Cache
//!
//! Last known machine types per shop, written by the types pass and read by
//! the machine list pass.
//!
//! ```text
//!   types pass  ──put(shop, types)──►  ┌──────────────────────────┐
//!                                      │ RwLock<HashMap<shop, []>>│
//!   list pass   ◄──────get(shop)─────  └──────────────────────────┘
//! ```
//!
//! Entries never expire. A failed refresh simply doesn't call `put`, so the
//! previous list stays in use.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use washwise_core::MachineType;

/// Shared, cloneable handle to the cache.
#[derive(Debug, Clone, Default)]
pub struct MachineTypeCache {
    inner: Arc<RwLock<HashMap<String, Vec<MachineType>>>>,
}

impl MachineTypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entry for a shop.
    pub async fn put(&self, shop_id: &str, types: Vec<MachineType>) {
        self.inner.write().await.insert(shop_id.to_string(), types);
    }

    /// Returns a copy of the last list written for a shop.
    pub async fn get(&self, shop_id: &str) -> Option<Vec<MachineType>> {
        self.inner.read().await.get(shop_id).cloned()
    }

    /// Shop ids with an entry, sorted.
    pub async fn shops(&self) -> Vec<String> {
        let mut shops: Vec<String> = self.inner.read().await.keys().cloned().collect();
        shops.sort();
        shops
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_absent_before_first_put() {
        let cache = MachineTypeCache::new();
        assert!(cache.get("S1").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_put_replaces_whole_entry() {
        let cache = MachineTypeCache::new();
        cache
            .put(
                "S1",
                vec![MachineType::new("T1", "Dryer"), MachineType::new("T2", "Washer")],
            )
            .await;
        cache.put("S1", vec![MachineType::new("T3", "Shoes")]).await;

        assert_eq!(
            cache.get("S1").await.unwrap(),
            vec![MachineType::new("T3", "Shoes")]
        );
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_empty_list_is_a_value() {
        let cache = MachineTypeCache::new();
        cache.put("S1", Vec::new()).await;
        assert_eq!(cache.get("S1").await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let cache = MachineTypeCache::new();
        let other = cache.clone();
        other.put("S2", vec![MachineType::new("T1", "Dryer")]).await;
        other.put("S1", vec![]).await;

        assert_eq!(cache.shops().await, vec!["S1".to_string(), "S2".to_string()]);
    }
}
