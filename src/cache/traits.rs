use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 缓存中保存的一条查询结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub country: String,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(country: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            country: country.into(),
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// IP → 国家代码缓存
///
/// 所有实现都不向调用方返回错误：后端故障只记录日志，
/// 读取按未命中处理，写入直接丢弃。
#[async_trait]
pub trait CountryCache: Send + Sync {
    /// 读取未过期的条目
    async fn get(&self, ip: &str) -> Option<CacheEntry>;

    /// 写入（覆盖）条目，`expires_at` 之后不再返回
    async fn put(&self, ip: &str, country: &str, expires_at: DateTime<Utc>);

    /// 清理已过期的条目，返回删除数量
    async fn purge_expired(&self) -> u64 {
        // 默认实现：依赖后端自身的过期机制
        tracing::trace!("Cache backend {} expires entries on its own", self.name());
        0
    }

    /// 后端名称（用于日志和健康检查）
    fn name(&self) -> &'static str;
}
