use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{error, trace, warn};

use super::types::{LookupResponse, error_response};
use crate::errors::GeoProxyError;
use crate::services::CountryService;
use crate::utils::{TrustedProxies, extract_client_ip};

/// 查询调用方自身 IP 的国家代码，路径内容被忽略
pub struct LookupHandler;

impl LookupHandler {
    pub async fn lookup(
        req: HttpRequest,
        service: web::Data<Arc<CountryService>>,
        proxies: web::Data<TrustedProxies>,
    ) -> impl Responder {
        let ip = match extract_client_ip(&req, &proxies) {
            Ok(ip) => ip,
            Err(e) => {
                warn!("Rejecting request to {}: {}", req.path(), e);
                return error_response(&e);
            }
        };

        match service.resolve(ip).await {
            Ok(found) => {
                trace!("Answered {} with {:?} ({:?})", ip, found.country, found.source);
                HttpResponse::Ok()
                    .append_header(("Content-Type", "application/json; charset=utf-8"))
                    .json(LookupResponse {
                        ip: found.ip.to_string(),
                        country: found.country,
                    })
            }
            Err(e) => {
                match &e {
                    GeoProxyError::NoServiceAvailable(_) => {
                        warn!("Lookup for {} rejected: {}", ip, e)
                    }
                    _ => error!("Lookup for {} failed: {}", ip, e),
                }
                error_response(&e)
            }
        }
    }
}

/// 查询路由：任意路径的 GET / HEAD
pub fn lookup_routes() -> actix_web::Resource {
    web::resource("/{tail:.*}")
        .route(web::get().to(LookupHandler::lookup))
        .route(web::head().to(LookupHandler::lookup))
}
