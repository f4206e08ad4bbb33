use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};
mod api;
use crate::api::{
    health::health_config,
    scan::{handlers::scan_config, ScanService},
    validation,
};
mod cli;
mod config;
mod scanner;
mod shutdown;
use crate::cli::Cli;
use crate::shutdown::ShutdownCoordinator;

/// Initialize console logging plus daily rotating files split by level
///
/// Log files are created as: logs/info.log.2026-10-16, logs/error.log.2026-10-16, etc.
fn init_logging(log_dir: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let info_file = tracing_appender::rolling::daily(log_dir, "info.log");
    let warn_file = tracing_appender::rolling::daily(log_dir, "warn.log");
    let error_file = tracing_appender::rolling::daily(log_dir, "error.log");
    let debug_file = tracing_appender::rolling::daily(log_dir, "debug.log");

    let info_layer = tracing_subscriber::fmt::layer()
        .with_writer(info_file)
        .with_ansi(false)
        .with_filter(LevelFilter::INFO);

    let warn_layer = tracing_subscriber::fmt::layer()
        .with_writer(warn_file)
        .with_ansi(false)
        .with_filter(LevelFilter::WARN);

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_file)
        .with_ansi(false)
        .with_filter(LevelFilter::ERROR);

    let debug_layer = tracing_subscriber::fmt::layer()
        .with_writer(debug_file)
        .with_ansi(false)
        .with_filter(LevelFilter::DEBUG);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(info_layer)
        .with(warn_layer)
        .with(error_layer)
        .with(debug_layer)
        .init();

    Ok(())
}

/// Any origin, method and header, like the browser front ends expect
fn cors() -> Cors {
    Cors::permissive()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    // Environment first, command-line flags on top
    let config = config::Config::from_env().map_err(std::io::Error::other)?;
    let config = cli.apply(config);

    init_logging(&config.log_dir)?;

    info!("Starting scan-server");
    info!("Configuration loaded successfully:");
    info!("  - Scanner command: {}", config.command);
    info!(
        "  - Scanner device: {}",
        if config.device.is_empty() { "<default>" } else { config.device.as_str() }
    );
    info!("  - Scan timeout: {:?}", config.scan_timeout);
    info!("  - Max scan size: {:?} bytes", config.max_scan_size);
    info!("  - Device lock wait: {:?}", config.device_lock_timeout);

    let bind = (config.host.clone(), config.port);

    // One service for all workers so device locks are process-wide
    let scan_service = web::Data::new(ScanService::new(config));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors())
            .app_data(scan_service.clone())
            .app_data(validation::query_config())
            .configure(health_config)
            .configure(scan_config)
    });

    info!("Server starting on http://{}:{}", bind.0, bind.1);

    let server = server.bind(bind)?.run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let coordinator = ShutdownCoordinator::new(server_handle, server_task);
    coordinator.wait_for_shutdown().await
}
