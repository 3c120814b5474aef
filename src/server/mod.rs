use axum::{
    http::Method,
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::LogbookConfig;
use crate::service::LogService;
use crate::storage::LogStore;

pub mod routes;

/// Server state
pub struct AppState {
    pub service: LogService,
}

/// Build the HTTP router over a request layer
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/logs", get(routes::list_logs).post(routes::create_log))
        .route("/api/logs/statistics", get(routes::get_statistics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: &LogbookConfig) -> anyhow::Result<()> {
    let store = Arc::new(LogStore::open(&config.database)?);
    let state = Arc::new(AppState {
        service: LogService::from_config(Arc::clone(&store), config),
    });
    let app = router(state);

    let listener = TcpListener::bind(config.socket_addr()).await?;
    tracing::info!(
        "Serving logs from {:?} on {}",
        config.database,
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match Arc::try_unwrap(store) {
        Ok(store) => {
            store.close()?;
            tracing::info!("Log store closed");
        }
        Err(_) => tracing::warn!("Log store still referenced at shutdown, skipping explicit close"),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
