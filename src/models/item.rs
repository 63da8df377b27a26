//! Work item model.
//!
//! A work item is one schedulable unit of backlog work: an effort estimate,
//! a priority, and must-finish-before links to other items. The engine only
//! rewrites the schedule fields (`assigned_to`, `start_date`, `end_date`,
//! `duration_days`); everything else belongs to the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Effort estimate in story points.
///
/// A fixed Fibonacci-like scale. Serialized as the plain point value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum EffortSize {
    One,
    Two,
    Three,
    Five,
    Eight,
    Thirteen,
    TwentyOne,
}

impl EffortSize {
    /// All sizes, smallest first.
    pub const ALL: [EffortSize; 7] = [
        Self::One,
        Self::Two,
        Self::Three,
        Self::Five,
        Self::Eight,
        Self::Thirteen,
        Self::TwentyOne,
    ];

    /// Effort units (story points) represented by this size.
    pub fn units(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Five => 5,
            Self::Eight => 8,
            Self::Thirteen => 13,
            Self::TwentyOne => 21,
        }
    }
}

impl TryFrom<u32> for EffortSize {
    type Error = String;

    fn try_from(units: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|s| s.units() == units)
            .ok_or_else(|| format!("{units} is not a valid effort size (expected one of 1, 2, 3, 5, 8, 13, 21)"))
    }
}

impl From<EffortSize> for u32 {
    fn from(size: EffortSize) -> Self {
        size.units()
    }
}

impl fmt::Display for EffortSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.units())
    }
}

/// A backlog item to be ordered, dated, and allocated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Unique, stable identifier.
    pub id: String,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// Effort estimate. `None` = not estimated yet (never dated or allocated).
    pub effort: Option<EffortSize>,
    /// Priority rank (lower = more urgent).
    #[serde(default)]
    pub priority: i32,
    /// Ids of items that must finish before this one starts.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Assigned worker id.
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// First business day of work.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Last business day of work (inclusive).
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Duration in business days, counted inclusively.
    #[serde(default)]
    pub duration_days: Option<u32>,
}

impl WorkItem {
    /// Creates an unestimated item with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            effort: None,
            priority: 0,
            dependencies: Vec::new(),
            assigned_to: None,
            start_date: None,
            end_date: None,
            duration_days: None,
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the effort estimate.
    pub fn with_effort(mut self, effort: EffortSize) -> Self {
        self.effort = Some(effort);
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Adds a dependency on another item.
    pub fn with_dependency(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    /// Assigns a worker.
    pub fn with_worker(mut self, worker_id: impl Into<String>) -> Self {
        self.assigned_to = Some(worker_id.into());
        self
    }

    /// Sets start and end dates.
    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    /// Whether the item carries both dates.
    pub fn is_dated(&self) -> bool {
        self.start_date.is_some() && self.end_date.is_some()
    }

    /// The inclusive `[start, end]` range, if dated.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.start_date.zip(self.end_date)
    }

    /// Whether this item's date range overlaps `[start, end]` (inclusive).
    ///
    /// Undated items never overlap anything.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        match self.date_range() {
            Some((s, e)) => s <= end && start <= e,
            None => false,
        }
    }

    /// Clears every engine-computed date field.
    pub fn clear_dates(&mut self) {
        self.start_date = None;
        self.end_date = None;
        self.duration_days = None;
    }
}
