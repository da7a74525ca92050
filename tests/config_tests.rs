//! 配置加载集成测试

use std::fs;

use tempfile::TempDir;

use geoproxy::config::StaticConfig;
use geoproxy::errors::GeoProxyError;

#[test]
fn test_load_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("geoproxy.toml");
    fs::write(
        &path,
        r#"
[server]
host = "0.0.0.0"
port = 9000
trusted_proxies = ["10.0.0.0/8"]

[cache]
type = "memory"
lifetime = 3600

[[services]]
name = "ipinfo"
url = "https://ipinfo.io/{ip}/json"
reply_path = ["country"]
rate = 1000
period = 86400

[[services]]
url = "http://ip-api.com/json/{ip}"
reply_path = ["countryCode"]
rate = 45
period = 60
burst = 10
"#,
    )
    .unwrap();

    let config = StaticConfig::load(Some(&path)).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.trusted_proxies, vec!["10.0.0.0/8"]);
    assert_eq!(config.cache.lifetime, 3600);
    assert_eq!(config.services.len(), 2);
    assert_eq!(config.services[0].name.as_deref(), Some("ipinfo"));
    assert_eq!(config.services[0].burst, None);
    assert_eq!(config.services[1].burst, Some(10));
}

#[test]
fn test_load_json_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("services.json");
    fs::write(
        &path,
        r#"{
  "cache": {"type": "builtin", "lifetime": 86400},
  "services": [
    {"url": "https://ipinfo.io/{ip}/json", "reply_path": ["country"], "rate": 1000, "period": 86400}
  ]
}"#,
    )
    .unwrap();

    let config = StaticConfig::load(Some(&path)).unwrap();
    assert_eq!(config.cache.cache_type, "builtin");
    assert_eq!(config.services.len(), 1);
    assert_eq!(config.services[0].rate, 1000);
    assert_eq!(config.server.port, 8080);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = StaticConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, GeoProxyError::Config(_)));
}

#[test]
fn test_invalid_service_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        r#"
[[services]]
url = "https://ipinfo.io/{ip}/json"
reply_path = ["country"]
rate = 0
period = 60
"#,
    )
    .unwrap();

    let err = StaticConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, GeoProxyError::Config(_)));
}

#[test]
fn test_unknown_cache_type_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad_cache.toml");
    fs::write(&path, "[cache]\ntype = \"memcached\"\n").unwrap();

    let err = StaticConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, GeoProxyError::CachePluginNotFound(_)));
}

#[test]
fn test_saved_config_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = StaticConfig::default();
    config.server.port = 7070;
    config.save_to_file(&path).unwrap();

    let loaded = StaticConfig::load(Some(&path)).unwrap();
    assert_eq!(loaded.server.port, 7070);
    assert_eq!(loaded.services, config.services);
}
