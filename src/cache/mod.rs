//! 查询结果缓存
//!
//! 支持三种后端：
//! - `memory`: moka 进程内缓存（别名 `builtin`）
//! - `redis`: Redis，依靠键 TTL 过期
//! - `database`: SeaORM 表 `ip_country_cache`（别名 `postgres`），支持 SQLite / MySQL / PostgreSQL

pub mod database;
mod factory;
mod memory;
mod redis;
mod traits;

use std::fmt;
use std::str::FromStr;

use crate::errors::GeoProxyError;

pub use database::DatabaseCache;
pub use factory::CacheFactory;
pub use memory::MemoryCache;
pub use redis::RedisCache;
pub use traits::{CacheEntry, CountryCache};

/// 缓存后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Memory,
    Redis,
    Database,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Memory => "memory",
            CacheKind::Redis => "redis",
            CacheKind::Database => "database",
        }
    }
}

impl FromStr for CacheKind {
    type Err = GeoProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "builtin" => Ok(CacheKind::Memory),
            "redis" => Ok(CacheKind::Redis),
            "database" | "postgres" => Ok(CacheKind::Database),
            other => Err(GeoProxyError::cache_plugin_not_found(format!(
                "Unknown cache type '{}'. Available: memory, redis, database",
                other
            ))),
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
