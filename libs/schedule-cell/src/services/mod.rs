pub mod overlap;
pub mod geometry;
pub mod day_schedule;

pub use overlap::{layout_appointments, layout_with_strategy, max_overlap};
pub use geometry::apply_geometry;
pub use day_schedule::DayScheduleService;
