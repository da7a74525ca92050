use std::sync::Arc;

use tracing::info;

use super::{CacheKind, CountryCache, DatabaseCache, MemoryCache, RedisCache};
use crate::config::CacheConfig;
use crate::errors::Result;

pub struct CacheFactory;

impl CacheFactory {
    /// 根据配置创建缓存后端
    pub async fn create(config: &CacheConfig) -> Result<Arc<dyn CountryCache>> {
        let kind: CacheKind = config.cache_type.parse()?;

        let cache: Arc<dyn CountryCache> = match kind {
            CacheKind::Memory => Arc::new(MemoryCache::new(config.memory.max_capacity)),
            CacheKind::Redis => Arc::new(RedisCache::new(&config.redis).await?),
            CacheKind::Database => Arc::new(DatabaseCache::new(&config.database).await?),
        };

        info!(
            "Cache backend '{}' ready (lifetime {}s)",
            cache.name(),
            config.lifetime
        );
        Ok(cache)
    }
}
