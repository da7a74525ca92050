use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cache::{CacheFactory, CountryCache};
use crate::config::StaticConfig;
use crate::dispatch::ServiceDispatcher;
use crate::services::{CountryService, HttpFetcher};

/// 过期缓存清理间隔
const PURGE_INTERVAL_SECS: u64 = 600;

pub struct StartupContext {
    pub cache: Arc<dyn CountryCache>,
    pub dispatcher: Arc<ServiceDispatcher>,
    pub country_service: Arc<CountryService>,
}

/// 准备服务器启动的上下文
/// 包括缓存后端、上游调度器和查询服务
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    // 测试等场景中可能已安装过
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let cache = CacheFactory::create(&config.cache)
        .await
        .context("Failed to create cache backend")?;

    let dispatcher = Arc::new(
        ServiceDispatcher::from_config(&config.services)
            .context("Failed to build lookup service dispatcher")?,
    );
    if dispatcher.is_empty() {
        warn!("No lookup services configured, every cache miss will be answered with 503");
    } else {
        for status in dispatcher.status() {
            info!(
                "Lookup service {} ready with {} credits",
                status.name, status.burst
            );
        }
    }

    let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(config.upstream.timeout)));
    let country_service = Arc::new(CountryService::new(
        cache.clone(),
        dispatcher.clone(),
        fetcher,
        Duration::from_secs(config.cache.lifetime),
    ));

    spawn_purge_task(cache.clone());

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        cache,
        dispatcher,
        country_service,
    })
}

/// 定期清理过期缓存条目
fn spawn_purge_task(cache: Arc<dyn CountryCache>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(PURGE_INTERVAL_SECS));
        // 第一次 tick 立即返回
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = cache.purge_expired().await;
            if purged > 0 {
                debug!("Purged {} expired {} cache entries", purged, cache.name());
            }
        }
    });
}
