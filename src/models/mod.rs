//! Backlog planning domain models.
//!
//! Plain data owned by the caller: the engine reads these and rewrites only
//! the schedule fields of [`WorkItem`].
//!
//! # Domain Mappings
//!
//! | u-backlog | Agile team | Consulting | Maintenance crew |
//! |-----------|-----------|------------|------------------|
//! | WorkItem | Story/Ticket | Deliverable | Work order |
//! | Worker | Developer | Consultant | Technician |
//! | ScheduleConfig | Sprint velocity | Billable capacity | Crew throughput |

mod calendar;
mod config;
mod item;
mod warning;
mod worker;

pub use calendar::{
    easter_sunday, is_weekend, BusinessCalendar, Holiday, WeekendCalendar, WorkCalendar,
    HOLIDAY_TABLE_VERSION,
};
pub use config::ScheduleConfig;
pub use item::{EffortSize, WorkItem};
pub use warning::IdlenessWarning;
pub use worker::Worker;
