use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tokio::sync::RwLock;
use tracing::{debug, error, trace};

use super::traits::{CacheEntry, CountryCache};
use crate::config::RedisConfig;
use crate::errors::{GeoProxyError, Result};

/// Redis 缓存，过期交给键 TTL
pub struct RedisCache {
    client: redis::Client,
    /// 持久化连接，使用 RwLock 保护
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    key_prefix: String,
}

impl RedisCache {
    /// 创建并 PING 一次，连接失败时直接报错
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            GeoProxyError::cache_connection(format!("Invalid Redis URL '{}': {}", config.url, e))
        })?;
        let cache = Self::with_client(client, &config.key_prefix);

        let mut conn = cache.get_connection().await.map_err(|e| {
            GeoProxyError::cache_connection(format!(
                "Failed to connect to Redis at {}: {}",
                config.url, e
            ))
        })?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| GeoProxyError::cache_connection(format!("Redis ping failed: {}", e)))?;
        debug!(
            "Redis connection test successful: {} (prefix '{}')",
            pong, config.key_prefix
        );

        Ok(cache)
    }

    fn with_client(client: redis::Client, key_prefix: &str) -> Self {
        Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            key_prefix: key_prefix.to_string(),
        }
    }

    /// 获取或建立持久连接
    async fn get_connection(&self) -> std::result::Result<MultiplexedConnection, redis::RedisError> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // 双重检查，避免竞态条件
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = self.client.get_multiplexed_async_connection().await?;
        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection established and cached");

        Ok(new_conn)
    }

    /// 重置连接（在连接错误时调用）
    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    fn make_key(&self, ip: &str) -> String {
        format!("{}{}", self.key_prefix, ip)
    }
}

#[async_trait]
impl CountryCache for RedisCache {
    async fn get(&self, ip: &str) -> Option<CacheEntry> {
        let redis_key = self.make_key(ip);

        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                self.reset_connection().await;
                return None;
            }
        };

        let result: redis::RedisResult<Option<String>> = conn.get(&redis_key).await;

        match result {
            Ok(Some(data)) => match serde_json::from_str::<CacheEntry>(&data) {
                Ok(entry) if !entry.is_expired_at(Utc::now()) => {
                    trace!("Redis cache hit: {}", ip);
                    Some(entry)
                }
                Ok(_) => None,
                Err(e) => {
                    error!("Failed to deserialize cache entry for '{}': {}", ip, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                error!("Failed to get key '{}': {}", redis_key, e);
                // 连接可能已断开，重置连接
                self.reset_connection().await;
                None
            }
        }
    }

    async fn put(&self, ip: &str, country: &str, expires_at: DateTime<Utc>) {
        let ttl = (expires_at - Utc::now()).num_seconds();
        if ttl <= 0 {
            trace!("Skipping already expired entry for {}", ip);
            return;
        }

        let serialized = match serde_json::to_string(&CacheEntry::new(country, expires_at)) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to serialize cache entry for '{}': {}", ip, e);
                return;
            }
        };

        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                self.reset_connection().await;
                return;
            }
        };

        if let Err(e) = conn
            .set_ex::<String, String, ()>(self.make_key(ip), serialized, ttl as u64)
            .await
        {
            error!("Failed to insert key '{}' into cache: {}", ip, e);
            self.reset_connection().await;
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
