use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::inventory::LayoutError;

// Строка таблицы floors
#[derive(Debug, Clone, FromRow)]
pub struct FloorRow {
    pub code: String,
    pub name: String,
}

// Строка таблицы table_groups (как лежит в БД)
#[derive(Debug, Clone, FromRow)]
pub struct TableGroupRow {
    pub id: i64,
    pub floor_code: String,
    pub label: String,
    pub capacity_per_table: i32,
    pub max_table_count: i32,
    pub current_count: i32,
}

/// A kind of physical table on one floor, e.g. "4-seat table" on "1F".
///
/// `capacity_per_table` and `max_table_count` are fixed for the lifetime of a
/// seat session; only `current_count` is adjusted, and only through
/// [`SeatInventoryModel`](crate::inventory::SeatInventoryModel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableGroup {
    pub id: i64,
    pub floor_id: String,
    pub label: String,
    pub capacity_per_table: u32,
    pub max_table_count: u32,
    pub current_count: u32,
}

impl TableGroup {
    pub fn total_seats(&self) -> u64 {
        u64::from(self.max_table_count) * u64::from(self.capacity_per_table)
    }

    pub fn occupied_seats(&self) -> u64 {
        u64::from(self.current_count) * u64::from(self.capacity_per_table)
    }
}

impl TryFrom<TableGroupRow> for TableGroup {
    type Error = LayoutError;

    fn try_from(row: TableGroupRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let column = |name: &'static str, value: i32| {
            u32::try_from(value).map_err(|_| LayoutError::OutOfRange {
                table_group_id: id,
                column: name,
                value,
            })
        };

        Ok(TableGroup {
            id,
            capacity_per_table: column("capacity_per_table", row.capacity_per_table)?,
            max_table_count: column("max_table_count", row.max_table_count)?,
            current_count: column("current_count", row.current_count)?,
            floor_id: row.floor_code,
            label: row.label,
        })
    }
}
