use chrono::{Datelike, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One opening window. `weekday` counts from Monday = 0.
///
/// A window whose `closes_at` is not after `opens_at` runs past midnight into
/// the following day, e.g. 18:00–02:00.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OperatingHours {
    pub weekday: i16,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

impl OperatingHours {
    pub fn is_overnight(&self) -> bool {
        self.closes_at <= self.opens_at
    }

    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        let weekday = at.weekday().num_days_from_monday() as i16;
        let time = at.time();

        if !self.is_overnight() {
            return weekday == self.weekday && time >= self.opens_at && time < self.closes_at;
        }
        (weekday == self.weekday && time >= self.opens_at)
            || (weekday == (self.weekday + 1) % 7 && time < self.closes_at)
    }

    pub async fn for_venue(venue_id: i64, db: &crate::database::Database) -> Result<Vec<OperatingHours>, sqlx::Error> {
        sqlx::query_as::<_, OperatingHours>(
            "SELECT weekday, opens_at, closes_at FROM operating_hours
             WHERE venue_id = $1
             ORDER BY weekday, opens_at"
        )
        .bind(venue_id)
        .fetch_all(&db.pool)
        .await
    }
}

pub fn is_open_at(hours: &[OperatingHours], at: NaiveDateTime) -> bool {
    hours.iter().any(|window| window.is_open_at(at))
}
