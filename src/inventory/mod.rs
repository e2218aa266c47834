//! Seat inventory for an owner's seat-management session.
//!
//! Every [`TableGroup`] of a venue is stored exactly once, keyed by id. Floor
//! categories, including the synthetic "ALL" category, only hold ordered id
//! lists, so an adjustment made while one floor is selected is visible from
//! every other view of the same group.
//!
//! Counts change locally and are written out by an explicit save. At most one
//! save is in flight; it is split into [`SeatInventoryModel::begin_save`] and
//! [`SeatInventoryModel::finish_save`] so the caller can keep adjusting while
//! the store call is outstanding.

mod stats;
mod store;

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::TableGroup;

pub use stats::SeatStatistics;
pub use store::{BoxError, PersistenceFailure, SeatUsageStore};

/// Id of the synthetic category holding the table groups of every floor.
pub const ALL_FLOORS: &str = "ALL";
pub const ALL_FLOORS_NAME: &str = "All floors";

/// One-table step applied by [`SeatInventoryModel::adjust_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Increment,
    Decrement,
}

impl TryFrom<i32> for Adjustment {
    type Error = i32;

    fn try_from(delta: i32) -> Result<Self, Self::Error> {
        match delta {
            1 => Ok(Adjustment::Increment),
            -1 => Ok(Adjustment::Decrement),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    Idle,
    Saving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Another save was still pending; nothing was submitted.
    AlreadySaving,
}

/// Floor as delivered by the layout source, before it is indexed.
#[derive(Debug, Clone)]
pub struct FloorLayout {
    pub id: String,
    pub name: String,
    pub table_groups: Vec<TableGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FloorCategory {
    pub id: String,
    pub name: String,
    pub table_group_ids: Vec<i64>,
}

/// Malformed layout data, rejected when a session is loaded.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("floor id {0:?} is reserved for the all-floors view")]
    ReservedFloorId(String),
    #[error("floor {0:?} is listed twice")]
    DuplicateFloor(String),
    #[error("table group {0} is listed more than once")]
    DuplicateTableGroup(i64),
    #[error("table group {table_group_id} is filed under floor {found:?} but listed on {expected:?}")]
    FloorMismatch {
        table_group_id: i64,
        expected: String,
        found: String,
    },
    #[error("table group {table_group_id} belongs to unknown floor {floor:?}")]
    UnknownFloor { table_group_id: i64, floor: String },
    #[error("table group {0} has zero seats per table")]
    ZeroCapacity(i64),
    #[error("table group {table_group_id} has {current} of {max} tables occupied")]
    CountAboveMax {
        table_group_id: i64,
        current: u32,
        max: u32,
    },
    #[error("table group {table_group_id}: {column} = {value} is out of range")]
    OutOfRange {
        table_group_id: i64,
        column: &'static str,
        value: i32,
    },
}

/// Snapshot handed out by [`SeatInventoryModel::begin_save`].
///
/// The model stays in [`SaveStatus::Saving`] until
/// [`SeatInventoryModel::finish_save`] is called, so a ticket must always be
/// finished, whatever the store returned. A ticket dropped before the store
/// answered is released with [`SeatInventoryModel::cancel_save`].
#[derive(Debug, Clone)]
pub struct SaveTicket {
    venue_id: i64,
    table_groups: Vec<TableGroup>,
}

impl SaveTicket {
    pub fn venue_id(&self) -> i64 {
        self.venue_id
    }

    pub fn table_groups(&self) -> &[TableGroup] {
        &self.table_groups
    }

    pub async fn submit<S>(&self, store: &S) -> Result<(), PersistenceFailure>
    where
        S: SeatUsageStore + ?Sized,
    {
        store
            .persist_seat_usage(self.venue_id, &self.table_groups)
            .await
    }
}

struct SavingGuard<'a> {
    model: &'a mut SeatInventoryModel,
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.model.cancel_save();
    }
}

#[derive(Debug, Clone)]
pub struct SeatInventoryModel {
    venue_id: i64,
    table_groups: HashMap<i64, TableGroup>,
    // index 0 is always the all-floors category
    categories: Vec<FloorCategory>,
    selected: usize,
    statistics: SeatStatistics,
    status: SaveStatus,
}

impl SeatInventoryModel {
    /// Indexes a venue layout. The all-floors category is selected initially.
    pub fn load(venue_id: i64, floors: Vec<FloorLayout>) -> Result<Self, LayoutError> {
        let mut table_groups = HashMap::new();
        let mut floor_ids = HashSet::new();
        let mut all_ids = Vec::new();
        let mut floor_categories = Vec::with_capacity(floors.len());

        for floor in floors {
            if floor.id == ALL_FLOORS {
                return Err(LayoutError::ReservedFloorId(floor.id));
            }
            if !floor_ids.insert(floor.id.clone()) {
                return Err(LayoutError::DuplicateFloor(floor.id));
            }

            let mut ids = Vec::with_capacity(floor.table_groups.len());
            for group in floor.table_groups {
                validate_group(&floor.id, &group)?;
                if table_groups.contains_key(&group.id) {
                    return Err(LayoutError::DuplicateTableGroup(group.id));
                }
                ids.push(group.id);
                table_groups.insert(group.id, group);
            }

            all_ids.extend_from_slice(&ids);
            floor_categories.push(FloorCategory {
                id: floor.id,
                name: floor.name,
                table_group_ids: ids,
            });
        }

        let mut categories = Vec::with_capacity(floor_categories.len() + 1);
        categories.push(FloorCategory {
            id: ALL_FLOORS.to_string(),
            name: ALL_FLOORS_NAME.to_string(),
            table_group_ids: all_ids,
        });
        categories.extend(floor_categories);

        let mut model = SeatInventoryModel {
            venue_id,
            table_groups,
            categories,
            selected: 0,
            statistics: SeatStatistics::default(),
            status: SaveStatus::Idle,
        };
        model.recompute_statistics();
        Ok(model)
    }

    pub fn venue_id(&self) -> i64 {
        self.venue_id
    }

    pub fn categories(&self) -> &[FloorCategory] {
        &self.categories
    }

    pub fn selected_category(&self) -> &FloorCategory {
        &self.categories[self.selected]
    }

    /// Table groups of the selected category, in category order.
    pub fn displayed(&self) -> impl Iterator<Item = &TableGroup> + '_ {
        self.groups_of(self.selected_category())
    }

    pub fn table_group(&self, id: i64) -> Option<&TableGroup> {
        self.table_groups.get(&id)
    }

    /// Statistics of the displayed table groups.
    pub fn statistics(&self) -> SeatStatistics {
        self.statistics
    }

    /// Statistics of any category without changing the selection.
    pub fn category_statistics(&self, category_id: &str) -> Option<SeatStatistics> {
        self.categories
            .iter()
            .find(|category| category.id == category_id)
            .map(|category| SeatStatistics::over(self.groups_of(category)))
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn is_saving(&self) -> bool {
        self.status == SaveStatus::Saving
    }

    /// Every table group in all-floors order.
    pub fn snapshot(&self) -> Vec<TableGroup> {
        self.groups_of(&self.categories[0]).cloned().collect()
    }

    /// Switches the displayed category. Unknown ids are ignored.
    pub fn select_category(&mut self, category_id: &str) -> bool {
        let Some(index) = self
            .categories
            .iter()
            .position(|category| category.id == category_id)
        else {
            debug!(venue_id = self.venue_id, category_id, "unknown floor category, ignoring");
            return false;
        };

        self.selected = index;
        self.recompute_statistics();
        true
    }

    /// Moves one table of a displayed group between free and occupied.
    ///
    /// Returns `false` without touching anything when the group is not
    /// displayed or the count is already at the bound in that direction.
    pub fn adjust_count(&mut self, table_group_id: i64, adjustment: Adjustment) -> bool {
        if !self.selected_category().table_group_ids.contains(&table_group_id) {
            return false;
        }
        let Some(group) = self.table_groups.get_mut(&table_group_id) else {
            return false;
        };

        let new_count = match adjustment {
            Adjustment::Increment => group.current_count.saturating_add(1).min(group.max_table_count),
            Adjustment::Decrement => group.current_count.saturating_sub(1),
        };
        if new_count == group.current_count {
            return false;
        }

        debug!(
            venue_id = self.venue_id,
            table_group_id,
            from = group.current_count,
            to = new_count,
            "table count adjusted"
        );
        group.current_count = new_count;
        self.recompute_statistics();
        true
    }

    /// Marks the model as saving and snapshots every table group.
    ///
    /// Returns `None` while a previous save is still pending.
    pub fn begin_save(&mut self) -> Option<SaveTicket> {
        if self.is_saving() {
            debug!(venue_id = self.venue_id, "save already in flight, rejecting");
            return None;
        }
        self.status = SaveStatus::Saving;
        Some(SaveTicket {
            venue_id: self.venue_id,
            table_groups: self.snapshot(),
        })
    }

    /// Returns the model to idle and passes the store result through.
    /// Local counts are left as they are on failure.
    pub fn finish_save(
        &mut self,
        result: Result<(), PersistenceFailure>,
    ) -> Result<SaveOutcome, PersistenceFailure> {
        self.status = SaveStatus::Idle;
        match result {
            Ok(()) => {
                info!(venue_id = self.venue_id, "seat usage saved");
                Ok(SaveOutcome::Saved)
            }
            Err(e) => {
                warn!(venue_id = self.venue_id, error = %e, "seat usage save failed, keeping local counts");
                Err(e)
            }
        }
    }

    /// Returns the model to idle when a save was abandoned without a store
    /// result. Local counts are kept.
    pub fn cancel_save(&mut self) -> bool {
        if !self.is_saving() {
            return false;
        }
        self.status = SaveStatus::Idle;
        warn!(venue_id = self.venue_id, "seat usage save abandoned before the store answered");
        true
    }

    pub async fn save<S>(&mut self, store: &S) -> Result<SaveOutcome, PersistenceFailure>
    where
        S: SeatUsageStore + ?Sized,
    {
        let Some(ticket) = self.begin_save() else {
            return Ok(SaveOutcome::AlreadySaving);
        };
        // dropping this future mid-call must not leave the model saving
        let mut guard = SavingGuard { model: self };
        let result = ticket.submit(store).await;
        guard.model.finish_save(result)
    }

    fn groups_of<'a>(
        &'a self,
        category: &'a FloorCategory,
    ) -> impl Iterator<Item = &'a TableGroup> + 'a {
        category
            .table_group_ids
            .iter()
            .filter_map(|id| self.table_groups.get(id))
    }

    fn recompute_statistics(&mut self) {
        self.statistics = SeatStatistics::over(self.displayed());
    }
}

fn validate_group(floor_id: &str, group: &TableGroup) -> Result<(), LayoutError> {
    if group.floor_id != floor_id {
        return Err(LayoutError::FloorMismatch {
            table_group_id: group.id,
            expected: floor_id.to_string(),
            found: group.floor_id.clone(),
        });
    }
    if group.capacity_per_table == 0 {
        return Err(LayoutError::ZeroCapacity(group.id));
    }
    if group.current_count > group.max_table_count {
        return Err(LayoutError::CountAboveMax {
            table_group_id: group.id,
            current: group.current_count,
            max: group.max_table_count,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn group(id: i64, floor: &str, capacity: u32, max: u32, current: u32) -> TableGroup {
        TableGroup {
            id,
            floor_id: floor.to_string(),
            label: format!("{capacity}-seat table"),
            capacity_per_table: capacity,
            max_table_count: max,
            current_count: current,
        }
    }

    fn floor(id: &str, table_groups: Vec<TableGroup>) -> FloorLayout {
        FloorLayout {
            id: id.to_string(),
            name: format!("Floor {id}"),
            table_groups,
        }
    }

    fn two_floor_model() -> SeatInventoryModel {
        SeatInventoryModel::load(
            42,
            vec![
                floor("1F", vec![group(1, "1F", 4, 2, 2), group(2, "1F", 2, 4, 1)]),
                floor("2F", vec![group(3, "2F", 6, 3, 0)]),
            ],
        )
        .unwrap()
    }

    struct RecordingStore {
        fail: bool,
        calls: Mutex<Vec<Vec<TableGroup>>>,
    }

    impl RecordingStore {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl SeatUsageStore for RecordingStore {
        async fn persist_seat_usage(
            &self,
            venue_id: i64,
            table_groups: &[TableGroup],
        ) -> Result<(), PersistenceFailure> {
            self.calls.lock().unwrap().push(table_groups.to_vec());
            if self.fail {
                Err(PersistenceFailure::new(venue_id, "connection reset"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn floor_selection_scopes_statistics() {
        let mut model = two_floor_model();
        assert!(model.select_category("1F"));

        let stats = model.statistics();
        assert_eq!(stats.total_capacity, 16);
        assert_eq!(stats.occupied_seats, 10);
        assert_eq!(stats.empty_seats, 6);
        assert_eq!(model.displayed().map(|g| g.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn all_floors_is_selected_after_load() {
        let model = two_floor_model();
        assert_eq!(model.selected_category().id, ALL_FLOORS);
        assert_eq!(model.categories()[0].table_group_ids, vec![1, 2, 3]);
        assert_eq!(model.statistics().total_capacity, 16 + 18);
    }

    #[test]
    fn all_floors_total_is_sum_of_floors() {
        let model = two_floor_model();
        let all = model.category_statistics(ALL_FLOORS).unwrap();
        let per_floor: u64 = ["1F", "2F"]
            .iter()
            .map(|id| model.category_statistics(id).unwrap().total_capacity)
            .sum();
        assert_eq!(all.total_capacity, per_floor);
    }

    #[test]
    fn unknown_category_is_ignored() {
        let mut model = two_floor_model();
        model.select_category("2F");
        let before = model.statistics();

        assert!(!model.select_category("9F"));
        assert_eq!(model.selected_category().id, "2F");
        assert_eq!(model.statistics(), before);
    }

    #[test]
    fn increment_at_max_is_ignored() {
        let mut model = two_floor_model();
        let before = model.statistics();

        assert!(!model.adjust_count(1, Adjustment::Increment));
        assert_eq!(model.table_group(1).unwrap().current_count, 2);
        assert_eq!(model.statistics(), before);
    }

    #[test]
    fn decrement_at_zero_is_ignored() {
        let mut model = two_floor_model();
        assert!(!model.adjust_count(3, Adjustment::Decrement));
        assert_eq!(model.table_group(3).unwrap().current_count, 0);
    }

    #[test]
    fn unknown_table_group_is_ignored() {
        let mut model = two_floor_model();
        let before = model.statistics();
        assert!(!model.adjust_count(999, Adjustment::Increment));
        assert_eq!(model.statistics(), before);
    }

    #[test]
    fn only_displayed_groups_can_be_adjusted() {
        let mut model = two_floor_model();
        model.select_category("2F");
        assert!(!model.adjust_count(2, Adjustment::Increment));
        assert_eq!(model.table_group(2).unwrap().current_count, 1);
    }

    #[test]
    fn adjustment_updates_statistics() {
        let mut model = two_floor_model();
        model.select_category("1F");

        assert!(model.adjust_count(2, Adjustment::Increment));
        let stats = model.statistics();
        assert_eq!(stats.occupied_seats, 12);
        assert_eq!(stats.empty_seats, 4);
    }

    #[test]
    fn floor_and_all_views_share_groups() {
        let mut model = two_floor_model();
        model.select_category("2F");
        assert!(model.adjust_count(3, Adjustment::Increment));

        model.select_category(ALL_FLOORS);
        assert_eq!(model.statistics().occupied_seats, 10 + 6);
        assert!(model.adjust_count(3, Adjustment::Increment));

        model.select_category("2F");
        assert_eq!(model.table_group(3).unwrap().current_count, 2);
        assert_eq!(model.statistics().occupied_seats, 12);
    }

    #[test]
    fn adjustment_parses_unit_steps_only() {
        assert_eq!(Adjustment::try_from(1), Ok(Adjustment::Increment));
        assert_eq!(Adjustment::try_from(-1), Ok(Adjustment::Decrement));
        assert_eq!(Adjustment::try_from(2), Err(2));
        assert_eq!(Adjustment::try_from(0), Err(0));
    }

    #[test]
    fn second_begin_save_is_rejected_until_finished() {
        let mut model = two_floor_model();
        let ticket = model.begin_save().unwrap();
        assert!(model.is_saving());
        assert!(model.begin_save().is_none());

        // mutation is still allowed while the save is pending
        model.select_category("2F");
        assert!(model.adjust_count(3, Adjustment::Increment));
        assert_eq!(ticket.table_groups()[2].current_count, 0);

        assert_eq!(model.finish_save(Ok(())).unwrap(), SaveOutcome::Saved);
        assert_eq!(model.status(), SaveStatus::Idle);
        assert!(model.begin_save().is_some());
    }

    #[tokio::test]
    async fn save_submits_all_floors_snapshot() {
        let mut model = two_floor_model();
        model.select_category("1F");
        model.adjust_count(2, Adjustment::Decrement);

        let store = RecordingStore::new(false);
        assert_eq!(model.save(&store).await.unwrap(), SaveOutcome::Saved);

        let calls = store.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let counts: Vec<_> = calls[0].iter().map(|g| (g.id, g.current_count)).collect();
        assert_eq!(counts, vec![(1, 2), (2, 0), (3, 0)]);
    }

    #[tokio::test]
    async fn failed_save_keeps_local_counts() {
        let mut model = two_floor_model();
        model.select_category("1F");
        model.adjust_count(2, Adjustment::Increment);

        let store = RecordingStore::new(true);
        let err = model.save(&store).await.unwrap_err();
        assert_eq!(err.venue_id, 42);
        assert_eq!(model.status(), SaveStatus::Idle);
        assert_eq!(model.table_group(2).unwrap().current_count, 2);
        assert_eq!(model.statistics().occupied_seats, 12);
    }

    #[test]
    fn load_rejects_malformed_layouts() {
        let reserved = SeatInventoryModel::load(1, vec![floor(ALL_FLOORS, vec![])]);
        assert!(matches!(reserved, Err(LayoutError::ReservedFloorId(_))));

        let duplicate = SeatInventoryModel::load(
            1,
            vec![
                floor("1F", vec![group(1, "1F", 4, 1, 0)]),
                floor("2F", vec![group(1, "2F", 4, 1, 0)]),
            ],
        );
        assert!(matches!(duplicate, Err(LayoutError::DuplicateTableGroup(1))));

        let zero = SeatInventoryModel::load(1, vec![floor("1F", vec![group(1, "1F", 0, 1, 0)])]);
        assert!(matches!(zero, Err(LayoutError::ZeroCapacity(1))));

        let over = SeatInventoryModel::load(1, vec![floor("1F", vec![group(1, "1F", 2, 1, 3)])]);
        assert!(matches!(over, Err(LayoutError::CountAboveMax { .. })));

        let misplaced = SeatInventoryModel::load(1, vec![floor("1F", vec![group(1, "2F", 2, 1, 0)])]);
        assert!(matches!(misplaced, Err(LayoutError::FloorMismatch { .. })));
    }

    #[test]
    fn increment_at_u32_max_is_a_no_op() {
        let mut model = SeatInventoryModel::load(
            9,
            vec![floor("1F", vec![group(1, "1F", 1, u32::MAX, u32::MAX)])],
        )
        .unwrap();

        assert!(!model.adjust_count(1, Adjustment::Increment));
        assert_eq!(model.table_group(1).unwrap().current_count, u32::MAX);
        assert!(model.adjust_count(1, Adjustment::Decrement));
        assert_eq!(model.table_group(1).unwrap().current_count, u32::MAX - 1);
    }

    struct StalledStore;

    impl SeatUsageStore for StalledStore {
        async fn persist_seat_usage(
            &self,
            _venue_id: i64,
            _table_groups: &[TableGroup],
        ) -> Result<(), PersistenceFailure> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn dropped_save_returns_to_idle() {
        let mut model = two_floor_model();
        model.adjust_count(3, Adjustment::Increment);

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            model.save(&StalledStore),
        )
        .await;
        assert!(timed_out.is_err());

        assert_eq!(model.status(), SaveStatus::Idle);
        assert_eq!(model.table_group(3).unwrap().current_count, 1);
        assert!(!model.cancel_save());

        let store = RecordingStore::new(false);
        assert_eq!(model.save(&store).await.unwrap(), SaveOutcome::Saved);
    }

    #[test]
    fn empty_venue_loads() {
        let model = SeatInventoryModel::load(5, Vec::new()).unwrap();
        assert_eq!(model.categories().len(), 1);
        assert_eq!(model.statistics(), SeatStatistics::default());
        assert!(model.snapshot().is_empty());
    }
}
