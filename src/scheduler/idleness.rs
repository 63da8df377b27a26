//! Idle-gap detection on per-worker calendars.
//!
//! Groups dated, assigned items by worker, sorts each group by start date,
//! and reports every run of one or more idle business days between
//! consecutive items. Adjacent or overlapping items produce no warning.

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{BusinessCalendar, IdlenessWarning, WorkItem};

/// Read-only analyzer for worker idle time.
#[derive(Debug, Clone, Copy)]
pub struct IdlenessAnalyzer<'a> {
    calendar: &'a dyn BusinessCalendar,
}

impl<'a> IdlenessAnalyzer<'a> {
    /// Creates an analyzer over `calendar`.
    pub fn new(calendar: &'a dyn BusinessCalendar) -> Self {
        Self { calendar }
    }

    /// Returns idle gaps, grouped by worker ID (ascending) then by date.
    pub fn analyze(&self, items: &[WorkItem]) -> Vec<IdlenessWarning> {
        let mut by_worker: BTreeMap<&str, Vec<&WorkItem>> = BTreeMap::new();
        for item in items {
            if let (Some(worker), true) = (item.assigned_to.as_deref(), item.is_dated()) {
                by_worker.entry(worker).or_default().push(item);
            }
        }

        let mut warnings = Vec::new();
        for (worker, mut group) in by_worker {
            group.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));

            for pair in group.windows(2) {
                let (Some(prev_end), Some(next_start)) = (pair[0].end_date, pair[1].start_date) else {
                    continue;
                };
                if next_start <= prev_end {
                    continue;
                }

                let gap_end = self.calendar.previous_business_day(next_start);
                let gap_days = self.calendar.count_business_days(prev_end, gap_end);
                if gap_days == 0 {
                    continue;
                }

                let warning = IdlenessWarning {
                    worker_id: worker.to_string(),
                    gap_days,
                    previous_item_id: pair[0].id.clone(),
                    next_item_id: pair[1].id.clone(),
                    gap_start: self.calendar.add_business_days(prev_end, 1),
                    gap_end,
                };
                debug!(%warning, "idle gap");
                warnings.push(warning);
            }
        }

        warnings
    }

    /// Total idle business days per worker.
    pub fn idle_days_by_worker(&self, items: &[WorkItem]) -> BTreeMap<String, u32> {
        let mut totals = BTreeMap::new();
        for w in self.analyze(items) {
            *totals.entry(w.worker_id).or_insert(0) += w.gap_days;
        }
        totals
    }
}
