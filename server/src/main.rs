mod api;
mod app;
mod auth;
mod config;
mod db;
mod error;
mod guard;
mod ledger;
mod models;
mod query;
mod raw_sql;
mod schema;
mod state;
mod store;
mod telemetry;
mod validation;

pub use state::AppState;

use config::{Config, StoreBackend};
use std::env;
use std::process;
use std::sync::Arc;
use store::{MemoryStore, PgStore, Store};
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        match api::openapi().to_pretty_json() {
            Ok(spec) => println!("{}", spec),
            Err(e) => {
                eprintln!("Failed to render OpenAPI spec: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    telemetry::init_telemetry();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let store: Arc<dyn Store> = match &config.store {
        StoreBackend::Postgres { database_url } => {
            Arc::new(PgStore::new(db::create_pool(database_url)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let cors = match app::cors(&config.client_url) {
        Ok(cors) => cors,
        Err(e) => {
            tracing::error!("Invalid CLIENT_URL {:?}: {}", config.client_url, e);
            process::exit(1);
        }
    };

    let state = AppState::new(store, config.listing, config.session_ttl_days);
    let app = app::router(state, cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listen address");

    tracing::info!("Server listening on {}", config.bind_addr);
    tracing::info!("Swagger UI available at /swagger-ui/");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}
