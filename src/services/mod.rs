pub mod seat_usage;
pub mod sessions;

pub use seat_usage::{load_layout, PgSeatUsageStore};
pub use sessions::{SeatSessions, SessionKey};
