//! Calendar-aware dating of an ordered backlog.
//!
//! # Algorithm
//!
//! Items are dated one by one in execution order:
//! 1. `duration = ceil(effort / velocity)`, at least one business day.
//! 2. Earliest start is the later of
//!    - one business day after the latest dependency end, and
//!    - one business day after the assigned worker's latest end so far;
//!    or the effective start date when neither applies.
//! 3. Snap forward to a business day; `end = start + (duration - 1)`
//!    business days (duration counts inclusively).
//!
//! Unassigned items ignore worker sequencing here; the allocation engine
//! enforces it once a worker is attached.
//!
//! # Complexity
//! O(n + e) calendar steps, plus O(duration) per item for date stepping.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, instrument};

use crate::models::{BusinessCalendar, ScheduleConfig, WorkItem};

/// Computes durations and start/end dates.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use u_backlog::models::{EffortSize, ScheduleConfig, WeekendCalendar, WorkItem};
/// use u_backlog::scheduler::ScheduleCalculator;
///
/// let config = ScheduleConfig::new(21, 15).unwrap();
/// let calendar = WeekendCalendar;
/// let mut items = vec![WorkItem::new("A").with_effort(EffortSize::Eight)];
///
/// let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
/// ScheduleCalculator::new(&config, &calendar).schedule(&mut items, monday);
///
/// assert_eq!(items[0].duration_days, Some(6));
/// assert_eq!(items[0].start_date, Some(monday));
/// assert_eq!(items[0].end_date, NaiveDate::from_ymd_opt(2025, 1, 13));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ScheduleCalculator<'a> {
    config: &'a ScheduleConfig,
    calendar: &'a dyn BusinessCalendar,
}

impl<'a> ScheduleCalculator<'a> {
    /// Creates a calculator for one configuration and calendar.
    pub fn new(config: &'a ScheduleConfig, calendar: &'a dyn BusinessCalendar) -> Self {
        Self { config, calendar }
    }

    /// Resolves the effective start date.
    ///
    /// Explicit override, then the configured roadmap start, then `today`;
    /// rolled forward to a business day.
    pub fn resolve_start(&self, start_override: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
        let date = start_override
            .or(self.config.roadmap_start)
            .unwrap_or(today);
        self.calendar.next_business_day(date)
    }

    /// Inclusive end date of an item that starts on `start` and lasts
    /// `duration` business days.
    pub fn end_date(&self, start: NaiveDate, duration: u32) -> NaiveDate {
        self.calendar
            .add_business_days(start, duration.saturating_sub(1))
    }

    /// Dates `ordered` in place.
    ///
    /// `ordered` must be in execution order (dependencies first). Items
    /// without an effort estimate have their dates cleared and don't
    /// constrain their dependents.
    #[instrument(skip_all, fields(items = ordered.len(), start = %effective_start))]
    pub fn schedule(&self, ordered: &mut [WorkItem], effective_start: NaiveDate) {
        let mut end_by_id: HashMap<String, NaiveDate> = HashMap::new();
        let mut worker_end: HashMap<String, NaiveDate> = HashMap::new();

        for item in ordered.iter_mut() {
            let Some(effort) = item.effort else {
                debug!(item = %item.id, "no effort estimate, leaving undated");
                item.clear_dates();
                continue;
            };
            let duration = self.config.duration_for(effort);

            let after_deps = item
                .dependencies
                .iter()
                .filter_map(|dep| end_by_id.get(dep))
                .max()
                .map(|&end| self.calendar.add_business_days(end, 1));
            let after_worker = item
                .assigned_to
                .as_ref()
                .and_then(|w| worker_end.get(w))
                .map(|&end| self.calendar.add_business_days(end, 1));

            let candidate = match (after_deps, after_worker) {
                (Some(a), Some(b)) => a.max(b),
                (Some(a), None) | (None, Some(a)) => a,
                (None, None) => effective_start,
            };
            let start = self.calendar.next_business_day(candidate);
            let end = self.end_date(start, duration);

            item.duration_days = Some(duration);
            item.start_date = Some(start);
            item.end_date = Some(end);

            end_by_id.insert(item.id.clone(), end);
            if let Some(worker) = &item.assigned_to {
                let latest = worker_end.entry(worker.clone()).or_insert(end);
                if end > *latest {
                    *latest = end;
                }
            }

            debug!(item = %item.id, %start, %end, duration, "dated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EffortSize, WeekendCalendar, WorkCalendar};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn config() -> ScheduleConfig {
        // velocity 1 unit/day
        ScheduleConfig::new(10, 10).unwrap()
    }

    fn item(id: &str, effort: EffortSize, deps: &[&str]) -> WorkItem {
        deps.iter()
            .fold(WorkItem::new(id).with_effort(effort), |it, dep| it.with_dependency(*dep))
    }

    #[test]
    fn test_resolve_start_precedence() {
        let cfg = config().with_roadmap_start(d(2025, 2, 3));
        let cal = WeekendCalendar;
        let calc = ScheduleCalculator::new(&cfg, &cal);

        assert_eq!(calc.resolve_start(Some(d(2025, 1, 6)), d(2025, 3, 3)), d(2025, 1, 6));
        assert_eq!(calc.resolve_start(None, d(2025, 3, 3)), d(2025, 2, 3));

        let plain = config();
        let calc = ScheduleCalculator::new(&plain, &cal);
        assert_eq!(calc.resolve_start(None, d(2025, 3, 3)), d(2025, 3, 3));
        // Saturday override rolls to Monday
        assert_eq!(calc.resolve_start(Some(d(2025, 1, 11)), d(2025, 3, 3)), d(2025, 1, 13));
    }

    #[test]
    fn test_single_item() {
        let cfg = config();
        let cal = WeekendCalendar;
        let mut items = vec![item("A", EffortSize::Three, &[])];
        ScheduleCalculator::new(&cfg, &cal).schedule(&mut items, d(2025, 1, 6));

        assert_eq!(items[0].duration_days, Some(3));
        assert_eq!(items[0].start_date, Some(d(2025, 1, 6)));
        assert_eq!(items[0].end_date, Some(d(2025, 1, 8)));
    }

    #[test]
    fn test_dependency_starts_next_business_day() {
        let cfg = config();
        let cal = WeekendCalendar;
        // A: Mon..Fri, B depends on A -> next Monday
        let mut items = vec![
            item("A", EffortSize::Five, &[]),
            item("B", EffortSize::Two, &["A"]),
        ];
        ScheduleCalculator::new(&cfg, &cal).schedule(&mut items, d(2025, 1, 6));

        assert_eq!(items[0].end_date, Some(d(2025, 1, 10)));
        assert_eq!(items[1].start_date, Some(d(2025, 1, 13)));
        assert_eq!(items[1].end_date, Some(d(2025, 1, 14)));
    }

    #[test]
    fn test_latest_dependency_wins() {
        let cfg = config();
        let cal = WeekendCalendar;
        let mut items = vec![
            item("A", EffortSize::One, &[]),
            item("B", EffortSize::Three, &[]),
            item("C", EffortSize::One, &["A", "B"]),
        ];
        ScheduleCalculator::new(&cfg, &cal).schedule(&mut items, d(2025, 1, 6));

        // B ends Wed 8 -> C starts Thu 9
        assert_eq!(items[2].start_date, Some(d(2025, 1, 9)));
    }

    #[test]
    fn test_worker_sequencing() {
        let cfg = config();
        let cal = WeekendCalendar;
        let mut items = vec![
            item("A", EffortSize::Two, &[]).with_worker("w1"),
            item("B", EffortSize::Two, &[]).with_worker("w1"),
            item("C", EffortSize::Two, &[]).with_worker("w2"),
            item("D", EffortSize::Two, &[]),
        ];
        ScheduleCalculator::new(&cfg, &cal).schedule(&mut items, d(2025, 1, 6));

        assert_eq!(items[0].start_date, Some(d(2025, 1, 6)));
        assert_eq!(items[1].start_date, Some(d(2025, 1, 8))); // after A on w1
        assert_eq!(items[2].start_date, Some(d(2025, 1, 6))); // w2 is free
        assert_eq!(items[3].start_date, Some(d(2025, 1, 6))); // unassigned
    }

    #[test]
    fn test_worker_and_dependency_take_later() {
        let cfg = config();
        let cal = WeekendCalendar;
        let mut items = vec![
            item("A", EffortSize::Five, &[]).with_worker("w1"),
            item("B", EffortSize::One, &[]).with_worker("w2"),
            item("C", EffortSize::One, &["B"]).with_worker("w1"),
        ];
        ScheduleCalculator::new(&cfg, &cal).schedule(&mut items, d(2025, 1, 6));

        // dep says Tue 7, worker says Mon 13
        assert_eq!(items[2].start_date, Some(d(2025, 1, 13)));
    }

    #[test]
    fn test_holiday_aware_dates() {
        let cfg = config();
        let cal = WorkCalendar::new();
        // Start Wed 24 Dec 2025, 3 days: 24, 26, 29
        let mut items = vec![item("A", EffortSize::Three, &[])];
        ScheduleCalculator::new(&cfg, &cal).schedule(&mut items, d(2025, 12, 24));

        assert_eq!(items[0].end_date, Some(d(2025, 12, 29)));
        assert_eq!(cal.count_business_days(d(2025, 12, 23), d(2025, 12, 29)), 3);
    }

    #[test]
    fn test_velocity_example() {
        let cfg = ScheduleConfig::new(21, 15).unwrap();
        let cal = WeekendCalendar;
        let mut items = vec![item("A", EffortSize::Eight, &[])];
        ScheduleCalculator::new(&cfg, &cal).schedule(&mut items, d(2025, 1, 6));

        assert_eq!(items[0].duration_days, Some(6));
        assert_eq!(items[0].end_date, Some(d(2025, 1, 13)));
    }

    #[test]
    fn test_unestimated_item_left_undated() {
        let cfg = config();
        let cal = WeekendCalendar;
        let mut items = vec![
            WorkItem::new("A").with_dates(d(2024, 1, 1), d(2024, 1, 2)),
            item("B", EffortSize::One, &["A"]),
        ];
        ScheduleCalculator::new(&cfg, &cal).schedule(&mut items, d(2025, 1, 6));

        assert!(items[0].date_range().is_none());
        assert_eq!(items[1].start_date, Some(d(2025, 1, 6)));
    }
}
