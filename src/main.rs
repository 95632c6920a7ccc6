mod api;
mod config;
mod distance;
mod error;
mod geo;
mod models;
mod observability;
mod pricing;
mod relay;
mod state;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::distance::GreatCircle;
use crate::store::memory::MemoryStore;
use crate::store::sled::SledStore;
use crate::store::RequestStore;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let store: Arc<dyn RequestStore> = match config.store_backend.as_str() {
        "sled" => Arc::new(SledStore::open(&config.data_dir)?),
        "memory" => Arc::new(MemoryStore::new()),
        other => {
            return Err(error::AppError::Internal(format!(
                "unknown STORE_BACKEND: {other}, expected sled or memory"
            )));
        }
    };
    let app_state = state::AppState::new(&config, store, Arc::new(GreatCircle));
    let app = api::rest::router(Arc::new(app_state));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        store = %config.store_backend,
        "http server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
