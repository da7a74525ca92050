//! Server mode
//!
//! Configures and starts the HTTP server with the lookup and health routes.

use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::DefaultHeaders, web};
use anyhow::Result;
use tracing::{info, warn};

use crate::api::{AppStartTime, configure_routes};
use crate::config::StaticConfig;
use crate::runtime::lifetime;
use crate::utils::TrustedProxies;

/// Run the HTTP server
///
/// Logging must be initialized before calling this function.
pub async fn run_server(config: Arc<StaticConfig>) -> Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let startup = lifetime::startup::prepare_server_startup(&config)
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {}", e);
            e
        })?;

    let country_service = startup.country_service.clone();
    let health_prefix = config.server.health_prefix.clone();

    let trusted_proxies = TrustedProxies::new(config.server.trusted_proxies.clone());
    if trusted_proxies.is_empty() {
        warn!(
            "Auto-detect proxy mode: connections from private IPs will use X-Forwarded-For. \
             Configure server.trusted_proxies to restrict this."
        );
    } else {
        info!(
            "Explicit trusted proxies configured: {:?}",
            config.server.trusted_proxies
        );
    }

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    info!("Using {} CPU cores for the server", cpu_count);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(country_service.clone()))
            .app_data(web::Data::new(trusted_proxies.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .wrap(
                DefaultHeaders::new().add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .configure(|cfg| configure_routes(cfg, &health_prefix))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server.bind(&bind_address)?.run();

    // Wait for server or shutdown signal
    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown() => {
            warn!("Graceful shutdown: server stopped");
        }
    }

    Ok(())
}
