pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use error::{CatalogError, CatalogResult};
pub use logic::{VariantSettings, VariantUpdater, VariantsOutcome, VariantsView};

// Export all model types
pub use model::*;

// Export store types
pub use store::{CatalogStore, MemoryStore, PostgresStore, RateCache, TtlRateCache};

use axum::Router;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, StorageBackend};

/// Router serving the variant endpoints on top of `store`
pub fn build_app<S: CatalogStore + 'static>(
    store: Arc<S>,
    cache: Arc<dyn RateCache>,
    settings: VariantSettings,
) -> Router {
    let updater = VariantUpdater::new(store, cache, settings);
    routes::create_router::<S>().with_state(Arc::new(updater))
}

/// Drop expired rate cache entries every `period`
pub fn spawn_cache_sweeper(
    cache: Arc<dyn RateCache>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let removed = cache.clear_expired().await;
            if removed > 0 {
                log::debug!("Swept {} expired rate cache entries", removed);
            }
        }
    })
}

/// Connect the configured backend and build the application router
pub async fn app_from_config(config: &AppConfig) -> anyhow::Result<Router> {
    let settings = VariantSettings::from(&config.catalog);
    let cache: Arc<dyn RateCache> = Arc::new(TtlRateCache::new());
    if !settings.rate_cache_ttl.is_zero() {
        spawn_cache_sweeper(cache.clone(), settings.rate_cache_ttl);
    }

    let app = match config.database.backend {
        StorageBackend::Postgres => {
            let database_url = config.database_url()?;
            let store = PostgresStore::new(&database_url, config.database.max_connections).await?;
            store.migrate().await?;
            log::info!("Connected to PostgreSQL, migrations applied");
            build_app(Arc::new(store), cache, settings)
        }
        StorageBackend::Memory => {
            log::warn!("Using the in-memory store; data is lost on restart");
            build_app(Arc::new(MemoryStore::new()), cache, settings)
        }
    };
    Ok(app)
}
