//! seat_usage.rs
//!
//! Загрузка рассадки заведения из БД и сохранение занятости столов.
//!
//! - `load_layout` собирает этажи и группы столов в порядке `position`.
//! - `PgSeatUsageStore` пишет `current_count` всех групп одним UPDATE и
//!   сбрасывает публичный кеш статуса мест.

use std::collections::HashMap;

use thiserror::Error;
use tracing::info;

use crate::{
    cache::CacheService,
    database::Database,
    inventory::{FloorLayout, LayoutError, PersistenceFailure, SeatUsageStore},
    models::{FloorRow, TableGroup, TableGroupRow},
};

/// Some submitted groups were not updated: unknown id, another venue's
/// group, or a count above the stored table maximum.
#[derive(Debug, Error)]
#[error("{rejected} of {submitted} table groups were not updated")]
pub struct SeatUsageRejected {
    pub submitted: usize,
    pub rejected: usize,
}

#[derive(Clone)]
pub struct PgSeatUsageStore {
    db: Database,
    cache: CacheService,
}

impl PgSeatUsageStore {
    pub fn new(db: Database, cache: CacheService) -> Self {
        Self { db, cache }
    }
}

impl SeatUsageStore for PgSeatUsageStore {
    async fn persist_seat_usage(
        &self,
        venue_id: i64,
        table_groups: &[TableGroup],
    ) -> Result<(), PersistenceFailure> {
        let ids: Vec<i64> = table_groups.iter().map(|g| g.id).collect();
        let counts = table_groups
            .iter()
            .map(|g| i32::try_from(g.current_count))
            .collect::<Result<Vec<i32>, _>>()
            .map_err(|e| PersistenceFailure::new(venue_id, e))?;

        let mut tx = self
            .db
            .pool
            .begin()
            .await
            .map_err(|e| PersistenceFailure::new(venue_id, e))?;

        // Границы проверяются еще раз на стороне БД
        let updated = sqlx::query(
            r#"
            UPDATE table_groups t
            SET current_count = u.current_count, updated_at = NOW()
            FROM UNNEST($1::BIGINT[], $2::INT[]) AS u(id, current_count)
            WHERE t.id = u.id
              AND t.venue_id = $3
              AND u.current_count BETWEEN 0 AND t.max_table_count
            "#
        )
        .bind(&ids[..])
        .bind(&counts[..])
        .bind(venue_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| PersistenceFailure::new(venue_id, e))?
        .rows_affected();

        if updated != ids.len() as u64 {
            // откатываем всё, частичное сохранение не нужно
            let _ = tx.rollback().await;
            return Err(PersistenceFailure::new(
                venue_id,
                SeatUsageRejected {
                    submitted: ids.len(),
                    rejected: ids.len() - updated as usize,
                },
            ));
        }

        tx.commit()
            .await
            .map_err(|e| PersistenceFailure::new(venue_id, e))?;

        self.cache.invalidate_seat_status(venue_id).await;
        info!("Seat usage persisted for venue {}: {} table groups", venue_id, ids.len());
        Ok(())
    }
}

/// Loads the floors and table groups of a venue, ordered by `position`.
pub async fn load_layout(db: &Database, venue_id: i64) -> Result<Vec<FloorLayout>, crate::error::AppError> {
    let floors = sqlx::query_as::<_, FloorRow>(
        "SELECT code, name FROM floors WHERE venue_id = $1 ORDER BY position, code"
    )
    .bind(venue_id)
    .fetch_all(&db.pool)
    .await?;

    let groups = sqlx::query_as::<_, TableGroupRow>(
        "SELECT id, floor_code, label, capacity_per_table, max_table_count, current_count
         FROM table_groups
         WHERE venue_id = $1
         ORDER BY position, id"
    )
    .bind(venue_id)
    .fetch_all(&db.pool)
    .await?;

    Ok(assemble_layout(floors, groups)?)
}

/// Distributes table-group rows over their floors, keeping row order.
pub fn assemble_layout(floors: Vec<FloorRow>, groups: Vec<TableGroupRow>) -> Result<Vec<FloorLayout>, LayoutError> {
    let mut by_floor: HashMap<String, Vec<TableGroup>> = HashMap::new();
    for row in groups {
        let group = TableGroup::try_from(row)?;
        by_floor.entry(group.floor_id.clone()).or_default().push(group);
    }

    let layout: Vec<FloorLayout> = floors
        .into_iter()
        .map(|floor| FloorLayout {
            table_groups: by_floor.remove(&floor.code).unwrap_or_default(),
            id: floor.code,
            name: floor.name,
        })
        .collect();

    // группы, чей этаж не найден
    if let Some(group) = by_floor.into_values().flatten().next() {
        return Err(LayoutError::UnknownFloor {
            table_group_id: group.id,
            floor: group.floor_id,
        });
    }

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor(code: &str) -> FloorRow {
        FloorRow {
            code: code.to_string(),
            name: format!("Floor {code}"),
        }
    }

    fn row(id: i64, floor_code: &str) -> TableGroupRow {
        TableGroupRow {
            id,
            floor_code: floor_code.to_string(),
            label: "2-seat table".to_string(),
            capacity_per_table: 2,
            max_table_count: 5,
            current_count: 1,
        }
    }

    #[test]
    fn groups_follow_their_floor_in_row_order() {
        let layout = assemble_layout(
            vec![floor("1F"), floor("2F"), floor("B1")],
            vec![row(3, "2F"), row(1, "1F"), row(2, "2F")],
        )
        .unwrap();

        let ids: Vec<Vec<i64>> = layout
            .iter()
            .map(|f| f.table_groups.iter().map(|g| g.id).collect())
            .collect();
        assert_eq!(ids, vec![vec![1], vec![3, 2], vec![]]);
        assert_eq!(layout[2].id, "B1");
    }

    #[test]
    fn orphan_group_is_rejected() {
        let err = assemble_layout(vec![floor("1F")], vec![row(1, "1F"), row(9, "3F")]).unwrap_err();
        assert!(matches!(err, LayoutError::UnknownFloor { table_group_id: 9, .. }));
    }

    #[test]
    fn rejection_reports_counts() {
        let failure = PersistenceFailure::new(4, SeatUsageRejected { submitted: 3, rejected: 1 });
        let source = std::error::Error::source(&failure).unwrap();
        assert_eq!(source.to_string(), "1 of 3 table groups were not updated");
    }
}
