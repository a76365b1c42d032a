pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::{
    ScheduledAppointment, PositionedAppointment, LayoutStrategy, LayoutError,
    ScheduleGeometry, BlockGeometry, ScheduleError, DaySchedule,
};
pub use services::{layout_appointments, layout_with_strategy, DayScheduleService};

pub use router::schedule_routes;
