//! HTTP 接口
//!
//! - `{health_prefix}`、`{health_prefix}/ready`、`{health_prefix}/live`: 健康检查
//! - 其余任意路径: 返回调用方 IP 的国家代码

pub mod services;

use actix_web::web;

pub use services::{AppStartTime, HealthService, LookupHandler};

/// 注册全部路由，健康检查优先于兜底的查询路由
pub fn configure_routes(cfg: &mut web::ServiceConfig, health_prefix: &str) {
    cfg.service(web::scope(health_prefix).service(services::health_routes()))
        .service(services::lookup_routes());
}
