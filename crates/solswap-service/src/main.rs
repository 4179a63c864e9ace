use std::str::FromStr;
use tokio::signal;
use tracing_subscriber::{filter::LevelFilter, prelude::*};

#[derive(Debug, serde::Deserialize)]
struct MainConfig {
    bind_address: std::net::SocketAddr,
    appcfg: solswap_service::AppConfig,
    log_level: String,
}

#[tokio::main]
async fn main() {
    let settings = config::Config::builder()
        .set_default("bind_address", "0.0.0.0:3000")
        .expect("bind_address default")
        .set_default("log_level", "info")
        .expect("log_level default")
        .add_source(config::File::with_name("config.toml").required(false))
        .add_source(config::Environment::with_prefix("SOLSWAP").separator("__"))
        .build()
        .expect("Failed to build solswap config");

    let maincfg: MainConfig = settings
        .try_deserialize()
        .expect("Failed to parse solswap config");

    tracing_log::LogTracer::init().expect("LogTracer init");
    let level_filter = LevelFilter::from_str(&maincfg.log_level).expect("log level");
    let stdout_log = tracing_subscriber::fmt::layer().with_filter(level_filter);
    let subscriber = tracing_subscriber::registry().with(stdout_log);
    tracing::subscriber::set_global_default(subscriber)
        .expect("tracing::subscriber::set_global_default");

    let app = solswap_service::AppController::new(maincfg.appcfg).expect("AppController::new");
    let router = solswap_service::routes(app);

    let listener = tokio::net::TcpListener::bind(&maincfg.bind_address)
        .await
        .expect("Failed to bind to address");
    tracing::info!("listening on {}", maincfg.bind_address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutting down...");
}
