//! 上游服务调度器
//!
//! 从游标位置开始轮询各服务的令牌桶，返回第一个还有额度的服务。
//! 游标停在命中的下标上（而不是下一个），下一次扫描从这里开始。

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::token_bucket::{RatePolicy, TokenBucket};
use crate::config::ServiceConfig;
use crate::errors::{GeoProxyError, Result};
use crate::services::LookupService;

/// 单个服务的额度快照（用于健康检查）
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceStatus {
    pub name: String,
    pub available: f64,
    pub burst: f64,
}

/// 受锁保护的调度状态：所有令牌桶与游标
struct DispatchState {
    buckets: Vec<TokenBucket>,
    current: usize,
}

/// Round-robin dispatcher over rate-limited lookup services.
///
/// A single lock covers the cursor and every bucket for the whole scan, so
/// two concurrent callers can never spend the same credit. Service
/// descriptors live outside the lock and are handed out as `Arc`s.
pub struct ServiceDispatcher {
    services: Vec<Arc<LookupService>>,
    state: Mutex<DispatchState>,
}

impl ServiceDispatcher {
    pub fn new(entries: Vec<(LookupService, RatePolicy)>, now: Instant) -> Self {
        let mut services = Vec::with_capacity(entries.len());
        let mut buckets = Vec::with_capacity(entries.len());

        for (service, policy) in entries {
            services.push(Arc::new(service));
            buckets.push(TokenBucket::new(policy, now));
        }

        Self {
            services,
            state: Mutex::new(DispatchState {
                buckets,
                current: 0,
            }),
        }
    }

    /// 按配置顺序构建调度器，任何一项配置非法都直接返回错误
    pub fn from_config(services: &[ServiceConfig]) -> Result<Self> {
        let entries = services
            .iter()
            .map(|service| {
                Ok((
                    LookupService::from_config(service)?,
                    RatePolicy::try_from(service)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Service dispatcher built with {} services", entries.len());
        Ok(Self::new(entries, Instant::now()))
    }

    /// 选出一个还有额度的服务
    ///
    /// 所有服务都没有额度（或者没有配置任何服务）时返回
    /// `NoServiceAvailable`，此时游标不变；扫描过程中的补充不回滚。
    pub fn select(&self, now: Instant) -> Result<Arc<LookupService>> {
        let mut state = self.state.lock();
        let count = state.buckets.len();
        if count == 0 {
            return Err(GeoProxyError::no_service_available(
                "no lookup services configured",
            ));
        }

        let start = state.current;
        for offset in 0..count {
            let index = (start + offset) % count;
            let bucket = &mut state.buckets[index];
            bucket.fill(now);
            if bucket.consume() {
                state.current = index;
                let service = Arc::clone(&self.services[index]);
                trace!("Dispatching lookup to service #{} ({})", index, service.name());
                return Ok(service);
            }
        }

        debug!("All {} lookup services are out of credits", count);
        Err(GeoProxyError::no_service_available(
            "all lookup services are rate limited",
        ))
    }

    /// 上一次成功选中的下标
    pub fn current(&self) -> usize {
        self.state.lock().current
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn services(&self) -> &[Arc<LookupService>] {
        &self.services
    }

    /// 各服务当前额度（不触发补充）
    pub fn status(&self) -> Vec<ServiceStatus> {
        let state = self.state.lock();
        self.services
            .iter()
            .zip(state.buckets.iter())
            .map(|(service, bucket)| ServiceStatus {
                name: service.name().to_string(),
                available: bucket.capacity().max(0.0),
                burst: bucket.burst(),
            })
            .collect()
    }
}
