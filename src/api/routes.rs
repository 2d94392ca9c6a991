use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::api::handlers::{self, AppState};
use crate::store::CatalogStore;

pub fn create_router<S: CatalogStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Product variants
        .route(
            "/products/:product_id/variants",
            get(handlers::get_product_variants::<S>).put(handlers::put_product_variants::<S>),
        )
        // Variation variants
        .route(
            "/products/:product_id/variations/:variation_id/variants",
            get(handlers::get_variation_variants::<S>)
                .put(handlers::put_variation_variants::<S>),
        )
        .layer(CorsLayer::permissive())
}
