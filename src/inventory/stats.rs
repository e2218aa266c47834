use serde::Serialize;

use crate::models::TableGroup;

/// Seat totals over a set of table groups.
///
/// `empty_seats + occupied_seats == total_capacity` always holds, since a
/// group never has more occupied tables than it has tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeatStatistics {
    pub total_capacity: u64,
    pub occupied_seats: u64,
    pub empty_seats: u64,
}

impl SeatStatistics {
    pub fn over<'a, I>(groups: I) -> Self
    where
        I: IntoIterator<Item = &'a TableGroup>,
    {
        let (total_capacity, occupied_seats) = groups
            .into_iter()
            .fold((0u64, 0u64), |(total, occupied), group| {
                (total + group.total_seats(), occupied + group.occupied_seats())
            });

        SeatStatistics {
            total_capacity,
            occupied_seats,
            empty_seats: total_capacity - occupied_seats,
        }
    }

    /// Occupied share rounded down to whole percent; 0 for a venue without seats.
    pub fn occupancy_percent(&self) -> u8 {
        if self.total_capacity == 0 {
            return 0;
        }
        (self.occupied_seats * 100 / self.total_capacity) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: i64, capacity: u32, max: u32, current: u32) -> TableGroup {
        TableGroup {
            id,
            floor_id: "1F".to_string(),
            label: format!("{capacity}-seat table"),
            capacity_per_table: capacity,
            max_table_count: max,
            current_count: current,
        }
    }

    #[test]
    fn sums_capacity_and_occupancy() {
        let groups = [group(1, 4, 2, 2), group(2, 2, 4, 1)];
        let stats = SeatStatistics::over(&groups);
        assert_eq!(stats.total_capacity, 16);
        assert_eq!(stats.occupied_seats, 10);
        assert_eq!(stats.empty_seats, 6);
        assert_eq!(stats.occupancy_percent(), 62);
    }

    #[test]
    fn empty_set_is_zero() {
        let stats = SeatStatistics::over(std::iter::empty());
        assert_eq!(stats, SeatStatistics::default());
        assert_eq!(stats.occupancy_percent(), 0);
    }
}
