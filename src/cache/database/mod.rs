//! SeaORM 数据库缓存
//!
//! 表结构见 `migration` crate 的 `ip_country_cache`。
//! 写入使用 upsert，过期判断在读取时完成，清理由后台任务定期执行。

mod connection;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{error, info, trace};

use super::traits::{CacheEntry, CountryCache};
use crate::config::DatabaseConfig;
use crate::errors::Result;
use migration::entities::ip_country_cache;

pub use connection::{connect_generic, connect_sqlite, infer_backend_from_url, run_migrations};

pub struct DatabaseCache {
    db: DatabaseConnection,
    backend_name: &'static str,
}

impl DatabaseCache {
    /// 连接数据库并执行迁移
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let backend_name = infer_backend_from_url(&config.database_url)?;

        let db = if backend_name == "sqlite" {
            connect_sqlite(&config.database_url).await?
        } else {
            connect_generic(&config.database_url, backend_name, config.pool_size).await?
        };

        run_migrations(&db).await?;
        info!("{} cache backend initialized", backend_name.to_uppercase());

        Ok(Self { db, backend_name })
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend_name
    }

    async fn upsert(&self, ip: &str, country: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let model = ip_country_cache::ActiveModel {
            ip: Set(ip.to_string()),
            country: Set(country.to_string()),
            expires_at: Set(expires_at),
        };

        ip_country_cache::Entity::insert(model)
            .on_conflict(
                OnConflict::column(ip_country_cache::Column::Ip)
                    .update_columns([
                        ip_country_cache::Column::Country,
                        ip_country_cache::Column::ExpiresAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl CountryCache for DatabaseCache {
    async fn get(&self, ip: &str) -> Option<CacheEntry> {
        match ip_country_cache::Entity::find_by_id(ip.to_string())
            .one(&self.db)
            .await
        {
            Ok(Some(model)) if model.expires_at > Utc::now() => {
                trace!("Database cache hit: {}", ip);
                Some(CacheEntry::new(model.country, model.expires_at))
            }
            Ok(_) => None,
            Err(e) => {
                error!("Failed to read cache entry for {}: {}", ip, e);
                None
            }
        }
    }

    async fn put(&self, ip: &str, country: &str, expires_at: DateTime<Utc>) {
        if let Err(e) = self.upsert(ip, country, expires_at).await {
            error!("Failed to store cache entry for {}: {}", ip, e);
        }
    }

    async fn purge_expired(&self) -> u64 {
        match ip_country_cache::Entity::delete_many()
            .filter(ip_country_cache::Column::ExpiresAt.lte(Utc::now()))
            .exec(&self.db)
            .await
        {
            Ok(result) => result.rows_affected,
            Err(e) => {
                error!("Failed to purge expired cache entries: {}", e);
                0
            }
        }
    }

    fn name(&self) -> &'static str {
        "database"
    }
}
