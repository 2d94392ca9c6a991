use axum::serve;
use catalog_variants::app_from_config;
use catalog_variants::config::AppConfig;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress sqlx debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .parse_env("RUST_LOG")
        .init();

    let config = AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={} backend={:?} max_price_combinations={}",
        config.server_address(),
        config.database.backend,
        config.catalog.max_price_combinations
    );

    let app = app_from_config(&config).await?;

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Catalog variants server running on http://{}", bind_address);

    serve(listener, app).await?;

    Ok(())
}
