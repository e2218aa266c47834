use crate::{config::CacheConfig, redis_client::RedisClient};

pub mod seats;

#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    enabled: bool,
    seat_status_ttl: u64,
}

impl CacheService {
    pub fn new(redis: RedisClient, config: &CacheConfig, enabled: bool) -> Self {
        Self {
            redis,
            enabled,
            seat_status_ttl: config.seat_status_ttl_seconds,
        }
    }
}

pub(crate) fn seat_status_key(venue_id: i64) -> String {
    format!("seats:status:{}", venue_id)
}
