use axum::{
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::api::handlers;
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>() -> Router<Arc<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Horse endpoints
        .route(
            "/horses",
            get(handlers::search_horses::<S>).post(handlers::create_horse::<S>),
        )
        .route(
            "/horses/:id",
            get(handlers::get_horse::<S>)
                .put(handlers::update_horse::<S>)
                .delete(handlers::delete_horse::<S>),
        )
        .route(
            "/horses/ancestors/:id",
            get(handlers::get_horse_ancestors::<S>),
        )
        // Owner endpoints
        .route(
            "/owners",
            get(handlers::search_owners::<S>).post(handlers::create_owner::<S>),
        )
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}
