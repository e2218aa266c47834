use std::future::Future;

use thiserror::Error;

use crate::models::TableGroup;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The seat-usage update call failed. Local counts are kept as they were.
#[derive(Debug, Error)]
#[error("failed to persist seat usage for venue {venue_id}")]
pub struct PersistenceFailure {
    pub venue_id: i64,
    #[source]
    source: BoxError,
}

impl PersistenceFailure {
    pub fn new(venue_id: i64, source: impl Into<BoxError>) -> Self {
        Self {
            venue_id,
            source: source.into(),
        }
    }
}

/// Destination for a venue's seat usage.
///
/// Receives every table group of the venue in "all floors" order. Any error,
/// transport or validation, is reported as a [`PersistenceFailure`].
pub trait SeatUsageStore: Send + Sync {
    fn persist_seat_usage(
        &self,
        venue_id: i64,
        table_groups: &[TableGroup],
    ) -> impl Future<Output = Result<(), PersistenceFailure>> + Send;
}
