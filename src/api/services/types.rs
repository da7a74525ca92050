use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

use crate::errors::GeoProxyError;

/// 查询成功的响应体：`{"IP": "...", "Country": "..."}`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LookupResponse {
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "Country")]
    pub country: String,
}

/// 错误响应体
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
    pub message: String,
}

impl From<&GeoProxyError> for ErrorResponse {
    fn from(err: &GeoProxyError) -> Self {
        Self {
            code: err.code().to_string(),
            error: err.error_type().to_string(),
            message: err.message().to_string(),
        }
    }
}

/// 按错误类型映射状态码并返回 JSON
pub fn error_response(err: &GeoProxyError) -> HttpResponse {
    HttpResponse::build(err.status_code())
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ErrorResponse::from(err))
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthServiceCheck {
    pub name: String,
    pub available_credits: f64,
    pub burst: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthChecks {
    pub cache: String,
    pub services: Vec<HealthServiceCheck>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u32,
    pub checks: HealthChecks,
    pub response_time_ms: u32,
}
