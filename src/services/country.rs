//! IP → 国家代码查询服务
//!
//! 先查缓存；未命中时由调度器选出一个有额度的上游服务，
//! 查询成功后写回缓存。失败不在这里重试。

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, trace, warn};

use super::lookup::CountryFetcher;
use crate::cache::CountryCache;
use crate::dispatch::ServiceDispatcher;
use crate::errors::Result;

/// 结果来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupSource {
    Cache,
    Service(String),
}

/// 一次查询的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryLookup {
    pub ip: IpAddr,
    pub country: String,
    pub source: LookupSource,
}

pub struct CountryService {
    cache: Arc<dyn CountryCache>,
    dispatcher: Arc<ServiceDispatcher>,
    fetcher: Arc<dyn CountryFetcher>,
    cache_lifetime: Duration,
}

impl CountryService {
    pub fn new(
        cache: Arc<dyn CountryCache>,
        dispatcher: Arc<ServiceDispatcher>,
        fetcher: Arc<dyn CountryFetcher>,
        cache_lifetime: Duration,
    ) -> Self {
        Self {
            cache,
            dispatcher,
            fetcher,
            cache_lifetime,
        }
    }

    pub async fn resolve(&self, ip: IpAddr) -> Result<CountryLookup> {
        let key = ip.to_string();

        if let Some(entry) = self.cache.get(&key).await {
            trace!("Cache hit for {}", key);
            return Ok(CountryLookup {
                ip,
                country: entry.country,
                source: LookupSource::Cache,
            });
        }

        let service = self.dispatcher.select(Instant::now())?;

        let country = match self.fetcher.fetch(&service, &key).await {
            Ok(country) => country,
            Err(e) => {
                warn!("Lookup of {} via {} failed: {}", key, service.name(), e);
                return Err(e);
            }
        };

        self.cache.put(&key, &country, self.expires_at()).await;
        debug!(
            "Resolved {} to {:?} via {} ({})",
            key,
            country,
            service.name(),
            self.fetcher.name()
        );

        Ok(CountryLookup {
            ip,
            country,
            source: LookupSource::Service(service.name().to_string()),
        })
    }

    fn expires_at(&self) -> DateTime<Utc> {
        let lifetime = TimeDelta::from_std(self.cache_lifetime).unwrap_or(TimeDelta::MAX);
        Utc::now()
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn cache(&self) -> &Arc<dyn CountryCache> {
        &self.cache
    }

    pub fn dispatcher(&self) -> &Arc<ServiceDispatcher> {
        &self.dispatcher
    }
}
