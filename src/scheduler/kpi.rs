//! Roadmap quality metrics (KPIs).
//!
//! Computes planning indicators from a dated and allocated backlog.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Roadmap span | Business days from earliest start to latest end, inclusive |
//! | Busy days | Sum of item durations per worker |
//! | Idle days | Sum of idle gaps per worker |
//! | Utilization | Busy days / roadmap span, per worker |
//! | Unassigned | Dated items with no worker |
//!
//! All day counts are business days under the supplied calendar.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::IdlenessAnalyzer;
use crate::models::{BusinessCalendar, WorkItem, Worker};

/// Per-worker load figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerLoad {
    /// Items assigned to the worker.
    pub item_count: usize,
    /// Business days spent on assigned items.
    pub busy_days: u32,
    /// Business days idle between assigned items.
    pub idle_days: u32,
    /// busy_days / roadmap span (0.0 when the span is empty).
    pub utilization: f64,
}

/// Roadmap performance indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapKpi {
    /// Earliest start date across dated items.
    pub roadmap_start: Option<NaiveDate>,
    /// Latest end date across dated items.
    pub roadmap_end: Option<NaiveDate>,
    /// Business days from start to end, inclusive.
    pub span_days: u32,
    /// Items carrying both dates.
    pub dated_items: usize,
    /// Items without dates (typically unestimated).
    pub undated_items: usize,
    /// Dated items without a worker.
    pub unassigned_items: usize,
    /// Load per worker ID. Workers without items are listed with zeros.
    pub load_by_worker: BTreeMap<String, WorkerLoad>,
    /// Mean utilization across listed workers.
    pub avg_utilization: f64,
}

impl RoadmapKpi {
    /// Computes KPIs for `items`.
    ///
    /// `workers` only adds zero rows for workers without items; loads are
    /// taken from the items' `assigned_to` fields.
    pub fn calculate(items: &[WorkItem], workers: &[Worker], calendar: &dyn BusinessCalendar) -> Self {
        let ranges: Vec<(NaiveDate, NaiveDate)> = items.iter().filter_map(|i| i.date_range()).collect();
        let roadmap_start = ranges.iter().map(|r| r.0).min();
        let roadmap_end = ranges.iter().map(|r| r.1).max();
        let span_days = match (roadmap_start, roadmap_end) {
            (Some(start), Some(end)) => inclusive_days(calendar, start, end),
            _ => 0,
        };

        let mut load_by_worker: BTreeMap<String, WorkerLoad> = workers
            .iter()
            .map(|w| (w.id.clone(), WorkerLoad::default()))
            .collect();

        let mut unassigned_items = 0;
        for item in items {
            let Some((start, end)) = item.date_range() else {
                continue;
            };
            match &item.assigned_to {
                Some(worker) => {
                    let load = load_by_worker.entry(worker.clone()).or_default();
                    load.item_count += 1;
                    load.busy_days += item
                        .duration_days
                        .unwrap_or_else(|| inclusive_days(calendar, start, end));
                }
                None => unassigned_items += 1,
            }
        }

        for (worker, idle) in IdlenessAnalyzer::new(calendar).idle_days_by_worker(items) {
            load_by_worker.entry(worker).or_default().idle_days = idle;
        }

        for load in load_by_worker.values_mut() {
            load.utilization = if span_days == 0 {
                0.0
            } else {
                load.busy_days as f64 / span_days as f64
            };
        }

        let avg_utilization = if load_by_worker.is_empty() {
            0.0
        } else {
            load_by_worker.values().map(|l| l.utilization).sum::<f64>() / load_by_worker.len() as f64
        };

        Self {
            roadmap_start,
            roadmap_end,
            span_days,
            dated_items: ranges.len(),
            undated_items: items.len() - ranges.len(),
            unassigned_items,
            load_by_worker,
            avg_utilization,
        }
    }

    /// Total idle business days across all workers.
    pub fn total_idle_days(&self) -> u32 {
        self.load_by_worker.values().map(|l| l.idle_days).sum()
    }

    /// Whether the roadmap finishes by `deadline` with at least
    /// `min_utilization` average utilization.
    pub fn meets_thresholds(&self, deadline: NaiveDate, min_utilization: f64) -> bool {
        self.roadmap_end.map_or(true, |end| end <= deadline) && self.avg_utilization >= min_utilization
    }
}

fn inclusive_days(calendar: &dyn BusinessCalendar, start: NaiveDate, end: NaiveDate) -> u32 {
    calendar.count_business_days(start, end) + u32::from(calendar.is_business_day(start))
}
