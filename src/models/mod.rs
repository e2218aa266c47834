pub mod venue;
pub mod hours;
pub mod menu;
pub mod keep;
pub mod table_group;

pub use venue::Venue;
pub use hours::OperatingHours;
pub use menu::MenuItem;
pub use keep::Keep;
pub use table_group::{FloorRow, TableGroup, TableGroupRow};
