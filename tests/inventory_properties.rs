use proptest::prelude::*;

use seat_keeper::inventory::{Adjustment, FloorLayout, SeatInventoryModel, SeatStatistics, ALL_FLOORS};
use seat_keeper::models::TableGroup;

#[derive(Debug, Clone)]
enum Op {
    Select(usize),
    SelectUnknown,
    Adjust(usize, bool),
    AdjustUnknown,
}

fn layout_strategy() -> impl Strategy<Value = Vec<FloorLayout>> {
    // (floor index, capacity, max, occupied fraction)
    prop::collection::vec((0usize..3, 1u32..8, 0u32..6, 0u32..=100), 0..10).prop_map(|specs| {
        let mut floors: Vec<FloorLayout> = (1..=3)
            .map(|n| FloorLayout {
                id: format!("{n}F"),
                name: format!("Floor {n}"),
                table_groups: Vec::new(),
            })
            .collect();

        for (id, (floor, capacity, max, fraction)) in specs.into_iter().enumerate() {
            let floor_id = floors[floor].id.clone();
            floors[floor].table_groups.push(TableGroup {
                id: id as i64 + 1,
                floor_id,
                label: format!("{capacity}-seat table"),
                capacity_per_table: capacity,
                max_table_count: max,
                current_count: max * fraction / 100,
            });
        }
        floors
    })
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4).prop_map(Op::Select),
        Just(Op::SelectUnknown),
        (0usize..10, any::<bool>()).prop_map(|(i, up)| Op::Adjust(i, up)),
        Just(Op::AdjustUnknown),
    ]
}

fn apply(model: &mut SeatInventoryModel, op: &Op) {
    match *op {
        Op::Select(i) => {
            let id = model.categories()[i % model.categories().len()].id.clone();
            model.select_category(&id);
        }
        Op::SelectUnknown => {
            model.select_category("B1");
        }
        Op::Adjust(i, up) => {
            let ids = model.categories()[0].table_group_ids.clone();
            if ids.is_empty() {
                return;
            }
            let adjustment = if up { Adjustment::Increment } else { Adjustment::Decrement };
            model.adjust_count(ids[i % ids.len()], adjustment);
        }
        Op::AdjustUnknown => {
            model.adjust_count(-1, Adjustment::Increment);
        }
    }
}

proptest! {
    #[test]
    fn counts_stay_within_bounds(floors in layout_strategy(), ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut model = SeatInventoryModel::load(1, floors).unwrap();
        for op in &ops {
            apply(&mut model, op);
            for group in model.snapshot() {
                prop_assert!(group.current_count <= group.max_table_count);
            }
        }
    }

    #[test]
    fn statistics_always_balance(floors in layout_strategy(), ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut model = SeatInventoryModel::load(1, floors).unwrap();
        for op in &ops {
            apply(&mut model, op);
            let stats = model.statistics();
            prop_assert!(stats.occupied_seats <= stats.total_capacity);
            prop_assert_eq!(stats.empty_seats + stats.occupied_seats, stats.total_capacity);
            prop_assert_eq!(stats, SeatStatistics::over(model.displayed()));
        }
    }

    #[test]
    fn all_floors_equals_sum_of_floors(floors in layout_strategy(), ops in prop::collection::vec(op_strategy(), 0..30)) {
        let mut model = SeatInventoryModel::load(1, floors).unwrap();
        for op in &ops {
            apply(&mut model, op);
        }

        let all = model.category_statistics(ALL_FLOORS).unwrap();
        let (total, occupied) = model.categories()[1..]
            .iter()
            .map(|c| model.category_statistics(&c.id).unwrap())
            .fold((0, 0), |(t, o), s| (t + s.total_capacity, o + s.occupied_seats));
        prop_assert_eq!(all.total_capacity, total);
        prop_assert_eq!(all.occupied_seats, occupied);
    }

    #[test]
    fn bound_adjustments_change_nothing(floors in layout_strategy()) {
        let mut model = SeatInventoryModel::load(1, floors).unwrap();
        for group in model.snapshot() {
            let before = model.snapshot();
            let stats = model.statistics();
            let adjustment = if group.current_count == group.max_table_count {
                Adjustment::Increment
            } else if group.current_count == 0 {
                Adjustment::Decrement
            } else {
                continue;
            };
            prop_assert!(!model.adjust_count(group.id, adjustment));
            prop_assert_eq!(model.snapshot(), before);
            prop_assert_eq!(model.statistics(), stats);
        }
    }
}
