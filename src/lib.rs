pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod models;
pub mod routes;
pub mod store;
pub mod telemetry;

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::RwLock;

// Re-export main items
pub use config::Config;
pub use error::AppError;
pub use models::{Item, NewUser, User};
pub use routes::build_router;
pub use store::{ItemStore, StoreError};
pub use telemetry::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub items: Arc<RwLock<ItemStore>>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, items: ItemStore) -> anyhow::Result<Self> {
        let metrics = Metrics::new()?;
        metrics.set_items_stored(items.len());
        Ok(AppState {
            db_pool,
            items: Arc::new(RwLock::new(items)),
            metrics,
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("db_pool", &"<SqlitePool>")
            .field("items", &"<ItemStore>")
            .field("metrics", &"<Metrics>")
            .finish()
    }
}
