pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

use std::sync::Arc;

use axum::serve;
use tokio::net::TcpListener;

pub use api::handlers;
pub use api::routes;

pub use error::{ServiceError, ServiceResult};
pub use logic::{AncestorResolver, HorseService, HorseValidator, OwnerService, OwnerValidator};
pub use model::*;
pub use store::{MemoryStore, PostgresStore, Store};

use crate::config::{AppConfig, StoreBackend};

/// Serve the API for `store` on an already bound listener until the server stops.
pub async fn serve_store<S: Store + 'static>(store: Arc<S>, listener: TcpListener) -> anyhow::Result<()> {
    let app = crate::api::routes::create_router().with_state(store);
    serve(listener, app).await?;
    Ok(())
}

async fn prepare<S: Store>(store: &S) -> anyhow::Result<()> {
    if std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true" {
        log::info!("Loading seed data...");
        seed::load_seed_data(store).await?;
        log::info!("Seed data loaded successfully");
    }
    Ok(())
}

/// Build the configured store, optionally seed it, and serve the API on the
/// configured address.
pub async fn run_server(config: &AppConfig) -> anyhow::Result<()> {
    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Stud book server running on http://{}", bind_address);

    match config.database.backend {
        StoreBackend::Postgres => {
            log::info!("Connecting to PostgreSQL...");
            let store = PostgresStore::new(&config.database_url(), config.max_connections()).await?;

            log::info!("Running database migrations...");
            store.migrate().await?;

            prepare(&store).await?;
            serve_store(Arc::new(store), listener).await
        }
        StoreBackend::Memory => {
            log::warn!("Using the in-memory store; data is lost on shutdown");
            let store = MemoryStore::new();
            prepare(&store).await?;
            serve_store(Arc::new(store), listener).await
        }
    }
}
