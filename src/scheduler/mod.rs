//! Ordering, dating, allocation and evaluation passes.
//!
//! Each pass is a plain value over borrowed inputs; none of them keep state
//! between calls.
//!
//! # Pipeline
//!
//! | Pass | Type | Input → Output |
//! |------|------|----------------|
//! | Order | `BacklogOrderer` | acyclic backlog → execution order |
//! | Date | `ScheduleCalculator` | ordered items → durations, start/end dates |
//! | Allocate | `AllocationEngine` | dated items + workers → assignments |
//! | Idleness | `IdlenessAnalyzer` | allocated items → idle gaps |
//! | KPI | `RoadmapKpi` | allocated items → roadmap metrics |
//!
//! # References
//!
//! - Kahn (1962), "Topological sorting of large networks"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4

mod allocation;
mod calculator;
mod idleness;
mod kpi;
mod order;

pub use allocation::{AllocationEngine, AllocationOutcome, DEFAULT_MAX_ITERATIONS};
pub use calculator::ScheduleCalculator;
pub use idleness::IdlenessAnalyzer;
pub use kpi::{RoadmapKpi, WorkerLoad};
pub use order::BacklogOrderer;
