use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::policy::Expiry;
use moka::future::Cache;
use tracing::trace;

use super::traits::{CacheEntry, CountryCache};

/// 每个条目按自己的 `expires_at` 过期
struct EntryExpiry;

impl EntryExpiry {
    fn remaining(entry: &CacheEntry) -> Duration {
        (entry.expires_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(Self::remaining(value))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(Self::remaining(value))
    }
}

/// 进程内缓存（moka）
pub struct MemoryCache {
    inner: Cache<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .build();
        Self { inner }
    }

    /// 当前条目数（近似值）
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[async_trait]
impl CountryCache for MemoryCache {
    async fn get(&self, ip: &str) -> Option<CacheEntry> {
        let entry = self.inner.get(ip).await?;
        // moka 的过期是惰性的，这里再按墙钟时间确认一次
        if entry.is_expired_at(Utc::now()) {
            trace!("Memory cache entry for {} has expired", ip);
            return None;
        }
        Some(entry)
    }

    async fn put(&self, ip: &str, country: &str, expires_at: DateTime<Utc>) {
        self.inner
            .insert(ip.to_string(), CacheEntry::new(country, expires_at))
            .await;
    }

    async fn purge_expired(&self) -> u64 {
        let before = self.inner.entry_count();
        self.inner.run_pending_tasks().await;
        before.saturating_sub(self.inner.entry_count())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = MemoryCache::new(100);
        let expires_at = Utc::now() + TimeDelta::hours(1);
        cache.put("8.8.8.8", "US", expires_at).await;

        let entry = cache.get("8.8.8.8").await.unwrap();
        assert_eq!(entry.country, "US");
        assert_eq!(entry.expires_at, expires_at);
        assert!(cache.get("1.1.1.1").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_not_returned() {
        let cache = MemoryCache::new(100);
        cache
            .put("8.8.8.8", "US", Utc::now() - TimeDelta::seconds(1))
            .await;
        assert!(cache.get("8.8.8.8").await.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let cache = MemoryCache::new(100);
        let expires_at = Utc::now() + TimeDelta::hours(1);
        cache.put("8.8.8.8", "US", expires_at).await;
        cache.put("8.8.8.8", "CA", expires_at).await;
        assert_eq!(cache.get("8.8.8.8").await.unwrap().country, "CA");
    }
}
