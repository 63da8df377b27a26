//! Backlog scheduling and worker allocation.
//!
//! Turns a backlog of estimated work items with dependencies into a dated,
//! staffed roadmap on a business-day calendar.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `WorkItem`, `EffortSize`, `Worker`,
//!   `ScheduleConfig`, `WorkCalendar`, `IdlenessWarning`
//! - **`validation`**: Input integrity checks (duplicate IDs, unknown
//!   dependencies, cycles with their path, hypothetical edge checks)
//! - **`scheduler`**: Ordering, dating, allocation, idleness and KPI passes
//! - **`planner`**: The operations an application calls, plus store contracts
//! - **`error`**: [`SchedulingError`] and the crate [`Result`] alias
//!
//! # Architecture
//!
//! Every operation is a synchronous in-memory transformation. Configuration
//! and calendar are passed in explicitly; nothing is cached between calls.
//! Events are emitted through `tracing`; installing a subscriber is left to
//! the application.
//!
//! # References
//!
//! - Cormen et al. (2009), "Introduction to Algorithms", Ch. 22
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"

pub mod error;
pub mod models;
pub mod planner;
pub mod scheduler;
pub mod validation;

pub use error::{Result, SchedulingError};
pub use planner::Planner;
