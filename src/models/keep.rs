use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

// Закладка ("keep") пользователя на заведение
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Keep {
    pub venue_id: i64,
    pub venue_name: String,
    pub created_at: DateTime<Utc>,
}

impl Keep {
    pub async fn list_for(account_id: i64, db: &crate::database::Database) -> Result<Vec<Keep>, sqlx::Error> {
        sqlx::query_as::<_, Keep>(
            "SELECT k.venue_id, v.name AS venue_name, k.created_at
             FROM keeps k
             JOIN venues v ON v.id = k.venue_id
             WHERE k.account_id = $1
             ORDER BY k.created_at DESC"
        )
        .bind(account_id)
        .fetch_all(&db.pool)
        .await
    }

    pub async fn kept_venue_ids(account_id: i64, db: &crate::database::Database) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT venue_id FROM keeps WHERE account_id = $1")
            .bind(account_id)
            .fetch_all(&db.pool)
            .await
    }

    // Повторный keep не ошибка
    pub async fn add(account_id: i64, venue_id: i64, db: &crate::database::Database) -> Result<bool, sqlx::Error> {
        sqlx::query(
            "INSERT INTO keeps (account_id, venue_id) VALUES ($1, $2)
             ON CONFLICT (account_id, venue_id) DO NOTHING"
        )
        .bind(account_id)
        .bind(venue_id)
        .execute(&db.pool)
        .await
        .map(|r| r.rows_affected() > 0)
    }

    pub async fn remove(account_id: i64, venue_id: i64, db: &crate::database::Database) -> Result<bool, sqlx::Error> {
        sqlx::query("DELETE FROM keeps WHERE account_id = $1 AND venue_id = $2")
            .bind(account_id)
            .bind(venue_id)
            .execute(&db.pool)
            .await
            .map(|r| r.rows_affected() > 0)
    }
}
