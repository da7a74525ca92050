//! 配置值验证模块
//!
//! 所有非法配置在加载阶段就被拒绝，调度器构建时不会再遇到退化的速率。

use super::{CacheConfig, ServiceConfig, StaticConfig};
use crate::cache::CacheKind;
use crate::dispatch::RatePolicy;
use crate::errors::{GeoProxyError, Result};
use crate::services::LookupService;

/// 校验完整配置
pub fn validate_config(config: &StaticConfig) -> Result<()> {
    validate_cache(&config.cache)?;

    if config.upstream.timeout == 0 {
        return Err(GeoProxyError::config(
            "upstream.timeout must be greater than zero",
        ));
    }

    for service in &config.services {
        validate_service(service)?;
    }

    Ok(())
}

/// 校验单个上游服务：URL 模板和速率策略都必须能构建
pub fn validate_service(service: &ServiceConfig) -> Result<()> {
    LookupService::from_config(service)?;
    RatePolicy::try_from(service)?;
    Ok(())
}

fn validate_cache(cache: &CacheConfig) -> Result<()> {
    cache.cache_type.parse::<CacheKind>()?;

    if cache.lifetime == 0 {
        return Err(GeoProxyError::config(
            "cache.lifetime must be greater than zero",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(url: &str, rate: u32, period: u64) -> ServiceConfig {
        ServiceConfig {
            name: None,
            url: url.to_string(),
            reply_path: vec!["country".to_string()],
            rate,
            period,
            burst: None,
        }
    }

    #[test]
    fn test_valid_service() {
        assert!(validate_service(&service("https://ipinfo.io/{ip}/json", 1000, 86400)).is_ok());
    }

    #[test]
    fn test_zero_rate_rejected() {
        let err = validate_service(&service("https://ipinfo.io/{ip}/json", 0, 60)).unwrap_err();
        assert!(matches!(err, GeoProxyError::Config(_)));
    }

    #[test]
    fn test_zero_period_rejected() {
        let err = validate_service(&service("https://ipinfo.io/{ip}/json", 10, 0)).unwrap_err();
        assert!(err.message().contains("period"));
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        let err = validate_service(&service("https://ipinfo.io/json", 10, 60)).unwrap_err();
        assert!(err.message().contains("{ip}"));
    }

    #[test]
    fn test_non_http_template_rejected() {
        assert!(validate_service(&service("ftp://example.com/{ip}", 10, 60)).is_err());
        assert!(validate_service(&service("not a url {ip}", 10, 60)).is_err());
    }

    #[test]
    fn test_unknown_cache_type_rejected() {
        let mut config = StaticConfig::default();
        config.cache.cache_type = "memcached".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, GeoProxyError::CachePluginNotFound(_)));
    }

    #[test]
    fn test_zero_cache_lifetime_rejected() {
        let mut config = StaticConfig::default();
        config.cache.lifetime = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_service_list_is_allowed() {
        let mut config = StaticConfig::default();
        config.services.clear();
        assert!(validate_config(&config).is_ok());
    }
}
