use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{GeoProxyError, Result};

/// 未指定配置文件时尝试读取的默认路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 环境变量前缀，例如 GEOPROXY__SERVER__PORT=9000
pub const ENV_PREFIX: &str = "GEOPROXY";

/// 静态配置（启动时加载，运行期间不变）
///
/// - server: 监听地址、端口、CPU 数量、可信代理
/// - cache: 查询结果缓存
/// - upstream: 上游 HTTP 调用
/// - logging: 日志配置
/// - services: 上游查询服务列表（顺序即轮询顺序）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_services")]
    pub services: Vec<ServiceConfig>,
}

impl StaticConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 优先级：ENV > 配置文件 > 默认值
    /// 指定了 `path` 时文件必须存在，格式按扩展名识别（TOML / JSON）；
    /// 未指定时读取可选的 `config.toml`。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        use ::config::{Config, Environment, File};

        let builder = Config::builder();
        let builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_PATH).required(false)),
        };

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: StaticConfig = settings.try_deserialize()?;
        super::validators::validate_config(&config)?;
        Ok(config)
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GeoProxyError::serialization(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            upstream: UpstreamConfig::default(),
            logging: LoggingConfig::default(),
            services: default_services(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 可信代理（IP 或 CIDR），只有来自这些地址的 X-Forwarded-For 才会被采用。
    /// 为空时自动检测：来自私有地址的连接视为反向代理。
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
    #[serde(default = "default_health_prefix")]
    pub health_prefix: String,
}

/// 缓存系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(rename = "type")]
    #[serde(default = "default_cache_type")]
    pub cache_type: String,
    /// 查询结果保留时间（秒）
    #[serde(default = "default_cache_lifetime")]
    pub lifetime: u64,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// 内存缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_capacity")]
    pub max_capacity: u64,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_key_prefix")]
    pub key_prefix: String,
}

/// 数据库缓存配置（sqlite / mysql / postgres）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
}

/// 上游 HTTP 调用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// 单次请求超时（秒）
    #[serde(default = "default_upstream_timeout")]
    pub timeout: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 上游查询服务配置
///
/// `url` 使用 `{ip}` 作为占位符，`reply_path` 为返回 JSON 中国家代码的字段路径。
/// 每 `period` 秒最多 `rate` 次请求，`burst` 缺省（或为 0）时等于 `rate`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub url: String,
    #[serde(default)]
    pub reply_path: Vec<String>,
    pub rate: u32,
    pub period: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst: Option<u32>,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_health_prefix() -> String {
    "/health".to_string()
}

fn default_cache_type() -> String {
    "memory".to_string()
}

fn default_cache_lifetime() -> u64 {
    86400
}

fn default_memory_capacity() -> u64 {
    10000
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_redis_key_prefix() -> String {
    "geoproxy:".to_string()
}

fn default_database_url() -> String {
    "sqlite://geoproxy.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_upstream_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_services() -> Vec<ServiceConfig> {
    vec![ServiceConfig {
        name: Some("ip-api".to_string()),
        url: "http://ip-api.com/json/{ip}?fields=countryCode".to_string(),
        reply_path: vec!["countryCode".to_string()],
        rate: 45,
        period: 60,
        burst: None,
    }]
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            trusted_proxies: Vec::new(),
            health_prefix: default_health_prefix(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: default_cache_type(),
            lifetime: default_cache_lifetime(),
            memory: MemoryConfig::default(),
            redis: RedisConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_memory_capacity(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_redis_key_prefix(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout: default_upstream_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = StaticConfig::default();
        assert!(super::super::validators::validate_config(&config).is_ok());
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.cache.cache_type, "memory");
    }

    #[test]
    fn test_sample_config_round_trips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        assert!(sample.contains("[[services]]"));

        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.services, StaticConfig::default().services);
        assert_eq!(parsed.server.port, 8080);
    }
}
