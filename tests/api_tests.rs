//! HTTP 接口集成测试

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use async_trait::async_trait;
use serde_json::Value;

use geoproxy::api::{AppStartTime, configure_routes};
use geoproxy::cache::MemoryCache;
use geoproxy::dispatch::{RatePolicy, ServiceDispatcher};
use geoproxy::errors::{GeoProxyError, Result};
use geoproxy::services::{CountryFetcher, CountryService, LookupService};
use geoproxy::utils::TrustedProxies;

struct StaticFetcher {
    reply: std::result::Result<&'static str, &'static str>,
}

#[async_trait]
impl CountryFetcher for StaticFetcher {
    async fn fetch(&self, _service: &LookupService, _ip: &str) -> Result<String> {
        match self.reply {
            Ok(country) => Ok(country.to_string()),
            Err(msg) => Err(GeoProxyError::upstream(msg)),
        }
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

fn country_service(
    burst: Option<u32>,
    reply: std::result::Result<&'static str, &'static str>,
) -> Arc<CountryService> {
    let entries = burst
        .map(|burst| {
            vec![(
                LookupService::new("ipinfo", "https://ipinfo.io/{ip}/json", vec![
                    "country".to_string(),
                ]),
                RatePolicy::new(burst, Duration::from_secs(3600), None).unwrap(),
            )]
        })
        .unwrap_or_default();
    // 补充时间点设在未来，测试期间不会补充额度
    let dispatcher = Arc::new(ServiceDispatcher::new(
        entries,
        Instant::now() + Duration::from_secs(3600),
    ));

    Arc::new(CountryService::new(
        Arc::new(MemoryCache::new(100)),
        dispatcher,
        Arc::new(StaticFetcher { reply }),
        Duration::from_secs(86400),
    ))
}

macro_rules! init_app {
    ($service:expr, $proxies:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($service))
                .app_data(web::Data::new($proxies))
                .app_data(web::Data::new(AppStartTime {
                    start_datetime: chrono::Utc::now(),
                }))
                .configure(|cfg| configure_routes(cfg, "/health")),
        )
        .await
    };
}

#[actix_rt::test]
async fn test_lookup_returns_ip_and_country() {
    let app = init_app!(country_service(Some(5), Ok("DE")), TrustedProxies::default());

    let req = TestRequest::get()
        .uri("/")
        .peer_addr("203.0.113.9:4711".parse().unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["IP"], "203.0.113.9");
    assert_eq!(body["Country"], "DE");
}

#[actix_rt::test]
async fn test_path_is_ignored() {
    let app = init_app!(country_service(Some(5), Ok("NL")), TrustedProxies::default());

    let req = TestRequest::get()
        .uri("/some/arbitrary/path?x=1")
        .peer_addr("198.51.100.4:1000".parse().unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["Country"], "NL");
}

#[actix_rt::test]
async fn test_forwarded_header_from_local_proxy() {
    let app = init_app!(country_service(Some(5), Ok("DE")), TrustedProxies::default());

    let req = TestRequest::get()
        .uri("/")
        .peer_addr("127.0.0.1:5000".parse().unwrap())
        .insert_header(("X-Forwarded-For", "203.0.113.50, 10.0.0.1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["IP"], "203.0.113.50");
}

#[actix_rt::test]
async fn test_forwarded_header_from_untrusted_peer_is_ignored() {
    let proxies = TrustedProxies::new(vec!["10.0.0.0/8".to_string()]);
    let app = init_app!(country_service(Some(5), Ok("DE")), proxies);

    let req = TestRequest::get()
        .uri("/")
        .peer_addr("192.168.1.20:5000".parse().unwrap())
        .insert_header(("X-Real-IP", "203.0.113.50"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["IP"], "192.168.1.20");
}

#[actix_rt::test]
async fn test_garbage_forwarded_header_is_bad_request() {
    let app = init_app!(country_service(Some(5), Ok("DE")), TrustedProxies::default());

    let req = TestRequest::get()
        .uri("/")
        .peer_addr("127.0.0.1:5000".parse().unwrap())
        .insert_header(("X-Forwarded-For", "not-an-ip"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_no_services_is_unavailable() {
    let app = init_app!(country_service(None, Ok("DE")), TrustedProxies::default());

    let req = TestRequest::get()
        .uri("/")
        .peer_addr("203.0.113.9:4711".parse().unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "E009");
}

#[actix_rt::test]
async fn test_rate_limited_after_burst() {
    let app = init_app!(country_service(Some(1), Ok("DE")), TrustedProxies::default());

    let first = TestRequest::get()
        .uri("/")
        .peer_addr("203.0.113.1:4711".parse().unwrap())
        .to_request();
    assert_eq!(test::call_service(&app, first).await.status(), StatusCode::OK);

    let second = TestRequest::get()
        .uri("/")
        .peer_addr("203.0.113.2:4711".parse().unwrap())
        .to_request();
    assert_eq!(
        test::call_service(&app, second).await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );

    // 已缓存的 IP 不消耗额度
    let cached = TestRequest::get()
        .uri("/")
        .peer_addr("203.0.113.1:4711".parse().unwrap())
        .to_request();
    assert_eq!(test::call_service(&app, cached).await.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_upstream_failure_is_bad_gateway() {
    let app = init_app!(
        country_service(Some(5), Err("connection reset")),
        TrustedProxies::default()
    );

    let req = TestRequest::get()
        .uri("/")
        .peer_addr("203.0.113.9:4711".parse().unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "E006");
    assert!(body["message"].as_str().unwrap().contains("connection reset"));
}

#[actix_rt::test]
async fn test_head_request() {
    let app = init_app!(country_service(Some(5), Ok("DE")), TrustedProxies::default());

    let req = TestRequest::default()
        .method(actix_web::http::Method::HEAD)
        .uri("/")
        .peer_addr("203.0.113.9:4711".parse().unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_health_endpoints() {
    let app = init_app!(country_service(Some(5), Ok("DE")), TrustedProxies::default());

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["cache"], "memory");
    assert_eq!(body["checks"]["services"][0]["name"], "ipinfo");
    assert_eq!(body["checks"]["services"][0]["burst"], 5.0);

    let resp =
        test::call_service(&app, TestRequest::get().uri("/health/ready").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, "OK");

    let resp =
        test::call_service(&app, TestRequest::get().uri("/health/live").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_rt::test]
async fn test_health_without_services_is_unhealthy() {
    let app = init_app!(country_service(None, Ok("DE")), TrustedProxies::default());

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "unhealthy");
}
