pub mod config;
pub mod error;
pub mod database;
pub mod redis_client;
pub mod models;
pub mod inventory;
pub mod geo;
pub mod controllers;
pub mod middleware;
pub mod cache;
pub mod services;

use std::sync::Arc;
use tracing::info;

use services::{PgSeatUsageStore, SeatSessions};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub cache: cache::CacheService,
    pub sessions: Arc<SeatSessions>,
    pub seat_store: PgSeatUsageStore,
}

impl AppState {
    pub async fn new(config: &config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database).await?;
        info!("Database connected");

        db.run_migrations().await?;

        let redis = redis_client::RedisClient::new(&config.redis.url).await?;
        info!("Redis connected");

        let cache = cache::CacheService::new(
            redis,
            &config.cache,
            config.features.enable_seat_cache,
        );
        let seat_store = PgSeatUsageStore::new(db.clone(), cache.clone());

        Ok(Arc::new(Self {
            db,
            cache,
            sessions: Arc::new(SeatSessions::new()),
            seat_store,
        }))
    }
}
