use std::sync::Arc;

use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, EnvFilter};

use bizbooks::api::{self, AppState};
use bizbooks::config::{CliArgs, Config, LoggingConfig, StoreKind};
use bizbooks::session::SessionManager;
use bizbooks::store::{DocumentStore, InMemoryStore};
use bizbooks_sqlite::SqliteStore;

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();
    let config = Config::load(&cli);
    init_logging(&config.logging);

    let store: Arc<dyn DocumentStore> = match config.storage.backend {
        StoreKind::Memory => Arc::new(InMemoryStore::new()),
        StoreKind::Sqlite => match SqliteStore::new(&config.storage.sqlite_path) {
            Ok(s) => Arc::new(s),
            Err(e) => {
                tracing::error!(path = %config.storage.sqlite_path, error = %e, "Failed to open SQLite store");
                std::process::exit(1);
            }
        },
    };
    tracing::info!(backend = ?config.storage.backend, "Document store ready");

    let mut state = AppState::new(store, config.balance.sales_matching())
        .with_sessions(SessionManager::new().with_idle_timeout(config.session.idle_timeout()));
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => tracing::warn!(error = %e, "Metrics exporter not installed"),
    }

    if config.auth.enabled {
        tracing::info!(keys = config.auth.api_keys.len(), "API key authentication enabled");
    }
    let app = api::router(state, config.auth.clone());

    let addr = match config.listen_addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, "Invalid listen address");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "API listening");

    if let Err(e) = axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
