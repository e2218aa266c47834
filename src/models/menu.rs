use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Позиция меню; цена в минимальных денежных единицах
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub position: i32,
}

impl MenuItem {
    pub async fn for_venue(venue_id: i64, db: &crate::database::Database) -> Result<Vec<MenuItem>, sqlx::Error> {
        sqlx::query_as::<_, MenuItem>(
            "SELECT id, name, description, price, position FROM menu_items
             WHERE venue_id = $1
             ORDER BY position, id"
        )
        .bind(venue_id)
        .fetch_all(&db.pool)
        .await
    }
}
