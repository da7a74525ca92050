//! 单个上游服务的令牌桶限流
//!
//! 额度按时间连续（小数）累积，`fill` 与 `consume` 分离：
//! 调度器在同一时刻对多个桶只需读取一次时钟。

use std::time::{Duration, Instant};

use crate::config::ServiceConfig;
use crate::errors::{GeoProxyError, Result};

/// 速率策略：每 `period` 最多 `rate` 次请求，最多囤积 `burst` 个额度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatePolicy {
    rate: u32,
    period: Duration,
    burst: u32,
}

impl RatePolicy {
    /// `burst` 为 `None` 或 0 时取 `rate`
    pub fn new(rate: u32, period: Duration, burst: Option<u32>) -> Result<Self> {
        if rate == 0 {
            return Err(GeoProxyError::config("rate must be greater than zero"));
        }
        if period.is_zero() {
            return Err(GeoProxyError::config("period must be greater than zero"));
        }

        Ok(Self {
            rate,
            period,
            burst: burst.filter(|b| *b > 0).unwrap_or(rate),
        })
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }

    /// 生成一个额度所需的秒数
    pub fn step_secs(&self) -> f64 {
        self.period.as_secs_f64() / f64::from(self.rate)
    }
}

impl TryFrom<&ServiceConfig> for RatePolicy {
    type Error = GeoProxyError;

    fn try_from(service: &ServiceConfig) -> Result<Self> {
        Self::new(
            service.rate,
            Duration::from_secs(service.period),
            service.burst,
        )
        .map_err(|e| GeoProxyError::config(format!("service '{}': {}", service.url, e.message())))
    }
}

/// Token bucket with fractional credit accrual.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    step: f64,
    burst: f64,
    capacity: f64,
    last_fill: Instant,
}

impl TokenBucket {
    /// 新建的桶是满的
    pub fn new(policy: RatePolicy, now: Instant) -> Self {
        let burst = f64::from(policy.burst());
        Self {
            step: policy.step_secs(),
            burst,
            capacity: burst,
            last_fill: now,
        }
    }

    /// 按 `last_fill` 以来经过的时间补充额度，上限为 `burst`
    ///
    /// 没有新增额度时（`now` 不晚于 `last_fill`）不推进 `last_fill`，
    /// 小数部分留到下一次累积。
    pub fn fill(&mut self, now: Instant) {
        let tokens = now.saturating_duration_since(self.last_fill).as_secs_f64() / self.step;
        if tokens > 0.0 {
            self.capacity = (self.capacity + tokens).min(self.burst);
            self.last_fill = now;
        }
    }

    /// 消耗一个额度
    ///
    /// 任何正余额（哪怕是 0.3）都允许一次消耗，之后余额可以为负，
    /// 直到后续 `fill` 补回到 0 以上。
    pub fn consume(&mut self) -> bool {
        if self.capacity > 0.0 {
            self.capacity -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn burst(&self) -> f64 {
        self.burst
    }

    pub fn last_fill(&self) -> Instant {
        self.last_fill
    }
}
