use crate::model::{Id, Rate};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Read-through cache for rates looked up while building the price matrix
#[async_trait::async_trait]
pub trait RateCache: Send + Sync {
    async fn get(&self, id: Id) -> Option<Rate>;
    async fn set(&self, rate: Rate, ttl: Duration);
    async fn remove(&self, id: Id);
    /// Drop expired entries, returning how many were removed
    async fn clear_expired(&self) -> usize;
}

#[derive(Clone, Debug)]
struct CacheEntry {
    rate: Rate,
    expires_at: Instant,
}

/// In-memory rate cache with a fixed expiry per entry.
///
/// Entries are not refreshed on access: a rate read at second 59 of its
/// window is gone a second later.
#[derive(Debug, Default)]
pub struct TtlRateCache {
    entries: RwLock<HashMap<Id, CacheEntry>>,
}

impl TtlRateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl RateCache for TtlRateCache {
    async fn get(&self, id: Id) -> Option<Rate> {
        {
            let entries = self.entries.read().await;
            match entries.get(&id) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.rate.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: evict under the write lock
        let mut entries = self.entries.write().await;
        if entries
            .get(&id)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(&id);
        }
        None
    }

    async fn set(&self, rate: Rate, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            rate.id,
            CacheEntry {
                rate,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    async fn remove(&self, id: Id) {
        self.entries.write().await.remove(&id);
    }

    async fn clear_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Availability;

    fn rate(id: Id) -> Rate {
        let now = chrono::Utc::now();
        Rate {
            id,
            property_id: 1,
            enabled: true,
            price: 1.5,
            availability: Availability::Available,
            sku: format!("r{}", id),
            stock: 3,
            value_id: 100 + id,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_cache_basic_operations() {
        let cache = TtlRateCache::new();
        assert!(cache.get(1).await.is_none());

        cache.set(rate(1), Duration::from_secs(60)).await;
        let cached = cache.get(1).await;
        assert_eq!(cached.map(|r| r.sku), Some("r1".to_string()));

        cache.remove(1).await;
        assert!(cache.get(1).await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_entries_expire() {
        let cache = TtlRateCache::new();
        cache.set(rate(1), Duration::from_millis(20)).await;
        cache.set(rate(2), Duration::from_secs(60)).await;

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(cache.get(1).await.is_none());
        assert!(cache.get(2).await.is_some());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_clear_expired_counts_removed_entries() {
        let cache = TtlRateCache::new();
        cache.set(rate(1), Duration::ZERO).await;
        cache.set(rate(2), Duration::ZERO).await;
        cache.set(rate(3), Duration::from_secs(60)).await;

        assert_eq!(cache.clear_expired().await, 2);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_cached_rate_is_served_stale_until_removed() {
        let cache = TtlRateCache::new();
        cache.set(rate(1), Duration::from_secs(60)).await;

        let mut updated = rate(1);
        updated.sku = "changed".to_string();
        // A write elsewhere does not reach the cache on its own
        assert_eq!(cache.get(1).await.map(|r| r.sku), Some("r1".to_string()));

        cache.remove(1).await;
        cache.set(updated, Duration::from_secs(60)).await;
        assert_eq!(cache.get(1).await.map(|r| r.sku), Some("changed".to_string()));
    }
}
