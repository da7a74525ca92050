use clap::Parser;

use geoproxy::cli::Cli;
use geoproxy::config::{StaticConfig, init_config};
use geoproxy::runtime::modes::run_server;
use geoproxy::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.generate_config {
        println!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    }

    let config = match init_config(cli.config_path()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    // 日志 guard 需要活到进程结束
    let _guard = init_logging(&config.logging)?;
    tracing::info!(
        "GeoProxy {} starting with {} lookup service(s)",
        env!("CARGO_PKG_VERSION"),
        config.services.len()
    );

    run_server(config).await
}
