use crud_service::{build_router, db, telemetry, AppState, Config, ItemStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    // Keep provider alive until shutdown so buffered spans get flushed
    let otel_provider = telemetry::init_tracing(&config)?;
    config.log_warnings();

    info!("Starting crud-service...");

    let db_pool = db::connect(&config.database_url, config.database_max_connections).await?;
    info!("Connected to database: {}", config.database_url);

    db::init_schema(&db_pool).await?;
    info!("Database schema initialized");

    let items = if config.seed_items {
        ItemStore::seeded()
    } else {
        ItemStore::new()
    };
    info!(items = items.len(), "Item store ready");

    let state = AppState::new(db_pool.clone(), items)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    if let Some(provider) = otel_provider {
        if let Err(e) = provider.shutdown() {
            warn!(error = ?e, "Failed to flush spans on shutdown");
        }
    }
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = ?e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
