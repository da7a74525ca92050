//! 客户端 IP 提取
//!
//! 支持：
//! - 可信代理配置（trusted_proxies，单 IP 或 CIDR）
//! - 未配置时按私有地址自动检测反向代理

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;
use tracing::debug;

use crate::errors::{GeoProxyError, Result};

/// 可信代理列表（作为 actix app data 共享）
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies {
    entries: Vec<String>,
}

impl TrustedProxies {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.entries.iter().any(|proxy| {
            if proxy.contains('/') {
                ip_in_cidr(ip, proxy)
            } else {
                proxy.parse::<IpAddr>().is_ok_and(|addr| addr == *ip)
            }
        })
    }
}

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7
                || (v6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10
        }
    }
}

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };

    let Ok(prefix_len): std::result::Result<u8, _> = prefix_len.parse() else {
        return false;
    };

    let Ok(network_addr) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network_addr) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => {
            if prefix_len > 32 {
                return false;
            }
            let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u32::from_be_bytes(ip.octets());
            let net_bits = u32::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            if prefix_len > 128 {
                return false;
            }
            let mask = u128::MAX.checked_shl(128 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u128::from_be_bytes(ip.octets());
            let net_bits = u128::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        _ => false,
    }
}

/// 解析地址字符串，接受 `ip` 和 `ip:port` 两种形式
pub fn parse_client_addr(value: &str) -> Result<IpAddr> {
    let value = value.trim();
    value
        .parse::<IpAddr>()
        .or_else(|_| value.parse::<SocketAddr>().map(|addr| addr.ip()))
        .map_err(|_| GeoProxyError::invalid_address(format!("'{}' is not an IP address", value)))
}

/// 根据连接地址和转发头确定真实客户端 IP
///
/// 策略（按优先级）：
/// 1. 显式配置 trusted_proxies 且连接来自其中 → 使用转发头
/// 2. 显式配置但不匹配 → 使用连接 IP（不信任转发头）
/// 3. 未配置且连接来自私有 IP → 视为反向代理，使用转发头
/// 4. 默认 → 使用连接 IP
pub fn resolve_client_ip<F>(
    peer: Option<SocketAddr>,
    proxies: &TrustedProxies,
    get_forwarded_ip: F,
) -> Result<IpAddr>
where
    F: FnOnce() -> Option<String>,
{
    let peer_ip = peer
        .map(|addr| addr.ip())
        .ok_or_else(|| GeoProxyError::invalid_address("connection has no peer address"))?;

    let behind_proxy = if proxies.is_empty() {
        is_private_or_local(&peer_ip)
    } else {
        proxies.contains(&peer_ip)
    };

    if behind_proxy && let Some(forwarded) = get_forwarded_ip() {
        let real_ip = parse_client_addr(&forwarded)?;
        debug!("Proxy {} forwarded client {}", peer_ip, real_ip);
        return Ok(real_ip);
    }

    Ok(peer_ip)
}

/// 从 HttpRequest 提取真实客户端 IP
pub fn extract_client_ip(req: &HttpRequest, proxies: &TrustedProxies) -> Result<IpAddr> {
    resolve_client_ip(req.peer_addr(), proxies, || {
        extract_forwarded_ip_from_headers(req.headers())
    })
}

/// 从请求头提取转发的 IP（X-Forwarded-For 优先，其次 X-Real-IP）
pub fn extract_forwarded_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}
