use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Venue {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phone: Option<String>,
    pub image_url: Option<String>,
}

impl Venue {
    // Найти заведение по id
    pub async fn find(venue_id: i64, db: &crate::database::Database) -> Result<Option<Venue>, sqlx::Error> {
        sqlx::query_as::<_, Venue>(
            "SELECT id, owner_id, name, address, latitude, longitude, phone, image_url
             FROM venues WHERE id = $1"
        )
        .bind(venue_id)
        .fetch_optional(&db.pool)
        .await
    }

    pub async fn all(db: &crate::database::Database) -> Result<Vec<Venue>, sqlx::Error> {
        sqlx::query_as::<_, Venue>(
            "SELECT id, owner_id, name, address, latitude, longitude, phone, image_url
             FROM venues ORDER BY id"
        )
        .fetch_all(&db.pool)
        .await
    }
}
