//! 上游 GeoIP 查询
//!
//! `LookupService` 是不可变的服务描述（URL 模板 + 回复字段路径），
//! `HttpFetcher` 通过 ureq 在阻塞线程池中发起实际请求。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;
use ureq::Agent;
use url::Url;

use crate::config::ServiceConfig;
use crate::errors::{GeoProxyError, Result};

/// URL 模板中客户端 IP 的占位符
pub const IP_PLACEHOLDER: &str = "{ip}";

/// 上游查询服务描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupService {
    name: String,
    url_template: String,
    reply_path: Vec<String>,
}

impl LookupService {
    pub fn new(
        name: impl Into<String>,
        url_template: impl Into<String>,
        reply_path: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            reply_path,
        }
    }

    /// 从配置构建，URL 模板必须包含 `{ip}` 且为 http(s) 地址
    ///
    /// 未配置 `name` 时使用 URL 的主机名。
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        if !config.url.contains(IP_PLACEHOLDER) {
            return Err(GeoProxyError::config(format!(
                "service url '{}' has no {} placeholder",
                config.url, IP_PLACEHOLDER
            )));
        }

        let probe = config.url.replace(IP_PLACEHOLDER, "127.0.0.1");
        let parsed = Url::parse(&probe).map_err(|e| {
            GeoProxyError::config(format!("service url '{}' is invalid: {}", config.url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GeoProxyError::config(format!(
                "service url '{}' must use http or https",
                config.url
            )));
        }

        let name = config
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| parsed.host_str().map(String::from))
            .unwrap_or_else(|| config.url.clone());

        Ok(Self::new(name, config.url.clone(), config.reply_path.clone()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn reply_path(&self) -> &[String] {
        &self.reply_path
    }

    /// 生成针对某个 IP 的请求地址
    pub fn url_for(&self, ip: &str) -> String {
        self.url_template.replace(IP_PLACEHOLDER, ip)
    }

    /// 按 `reply_path` 从回复中取出国家代码
    pub fn extract_country(&self, reply: &Value) -> Result<String> {
        extract_string(reply, &self.reply_path)
    }
}

/// 沿字段路径逐层进入 JSON 对象，最终值必须是字符串
///
/// 空路径表示整个回复本身就是字符串。
pub fn extract_string(reply: &Value, path: &[String]) -> Result<String> {
    let mut value = reply;
    for field in path {
        value = value
            .as_object()
            .and_then(|object| object.get(field))
            .ok_or_else(|| {
                GeoProxyError::decode(format!("path not found: {}", path.join(".")))
            })?;
    }

    value
        .as_str()
        .map(String::from)
        .ok_or_else(|| GeoProxyError::decode(format!("path is not a string: {}", path.join("."))))
}

/// 国家代码查询接口
#[async_trait]
pub trait CountryFetcher: Send + Sync {
    /// 通过指定服务查询 IP 所属国家
    async fn fetch(&self, service: &LookupService, ip: &str) -> Result<String>;

    /// 获取 fetcher 名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 基于 ureq 的 HTTP 查询实现
pub struct HttpFetcher {
    agent: Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent }
    }

    /// 同步请求并解析 JSON（在 spawn_blocking 中调用）
    fn fetch_json_sync(agent: &Agent, url: &str) -> Result<Value> {
        let resp = agent.get(url).call().map_err(|e| {
            GeoProxyError::upstream(format!("request to \"{}\" failed: {}", url, e))
        })?;

        resp.into_body().read_json::<Value>().map_err(|e| {
            GeoProxyError::decode(format!("reply from \"{}\" is not valid JSON: {}", url, e))
        })
    }
}

#[async_trait]
impl CountryFetcher for HttpFetcher {
    async fn fetch(&self, service: &LookupService, ip: &str) -> Result<String> {
        let url = service.url_for(ip);
        let agent = self.agent.clone();

        let reply = tokio::task::spawn_blocking(move || Self::fetch_json_sync(&agent, &url))
            .await
            .map_err(|e| GeoProxyError::upstream(format!("lookup task failed: {}", e)))??;

        let country = service.extract_country(&reply)?;
        trace!("Service {} resolved {} to {:?}", service.name(), ip, country);
        Ok(country)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
