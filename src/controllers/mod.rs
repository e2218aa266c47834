pub mod venues;
pub mod keeps;
pub mod owner_seats;
pub mod owner_venue;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(venues::routes())
        .merge(keeps::routes())
        .merge(owner_seats::routes())
        .merge(owner_venue::routes())
}
