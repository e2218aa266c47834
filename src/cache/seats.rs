use crate::cache::{seat_status_key, CacheService};
use redis::AsyncCommands;
use tracing::{debug, warn};

impl CacheService {
    // Получить закешированный JSON статуса мест заведения
    pub async fn get_cached_seat_status(&self, venue_id: i64) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let mut conn = self.redis.conn.clone();
        match conn.get::<_, Option<String>>(seat_status_key(venue_id)).await {
            Ok(cached) => cached,
            Err(e) => {
                // Redis недоступен - идем в БД
                warn!("Seat status cache read failed for venue {}: {:?}", venue_id, e);
                None
            }
        }
    }

    pub async fn cache_seat_status(&self, venue_id: i64, json: &str) {
        if !self.enabled {
            return;
        }
        let mut conn = self.redis.conn.clone();
        let result: Result<(), _> = conn
            .set_ex(seat_status_key(venue_id), json, self.seat_status_ttl)
            .await;
        if let Err(e) = result {
            warn!("Failed to cache seat status for venue {}: {:?}", venue_id, e);
        }
    }

    // Инвалидировать кеш после сохранения занятости владельцем
    pub async fn invalidate_seat_status(&self, venue_id: i64) {
        if !self.enabled {
            return;
        }
        let mut conn = self.redis.conn.clone();
        let result: Result<(), _> = conn.del(seat_status_key(venue_id)).await;
        match result {
            Ok(()) => debug!("Invalidated seat status cache for venue {}", venue_id),
            Err(e) => warn!("Failed to invalidate seat status for venue {}: {:?}", venue_id, e),
        }
    }
}
