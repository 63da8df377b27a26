//! Greedy worker allocation with deferral.
//!
//! # Algorithm
//!
//! 1. Eligible items are unassigned, dated, and estimated; they are visited
//!    in ascending start-date order.
//! 2. A FIFO retry queue takes precedence over fresh items.
//! 3. For the current item, candidate workers are those with no assigned
//!    item overlapping its inclusive `[start, end]` range.
//! 4. With candidates: pick the least loaded (fewest assigned items), then
//!    alphabetically by name ignoring case, then by ID.
//! 5. Without: shift the item `attempts + 1` business days later, keep its
//!    duration, and requeue it. Successive retries move it +1, +2, +3, …
//!
//! The loop stops after a fixed iteration ceiling; leftovers are reported,
//! not dropped. Before each attempt an item's start is pushed past its
//! dependencies' current end dates, since a dependency may itself have been
//! deferred earlier in the run.
//!
//! Items that already sit on a calendar (pre-assigned, or allocated earlier
//! in the run) are settled after every allocation: dependents that now start
//! on or before the new item's end move past it, and any booking they then
//! collide with on their worker moves past them. Settling only ever moves
//! items later.
//!
//! Allocation is all-or-nothing: work happens on a copy and is written back
//! only on success.
//!
//! # Complexity
//! O(k * w * a) for k iterations, w workers, a assigned items per worker.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SchedulingError};
use crate::models::{BusinessCalendar, ScheduleConfig, WorkItem, Worker};

/// Default ceiling on allocation loop iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// An item waiting for a retry, with how many times it has been deferred.
#[derive(Debug, Clone, Copy)]
struct PendingAllocation {
    index: usize,
    attempts: u32,
}

/// Summary of one allocation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    /// Items that received a worker in this run.
    pub assigned_count: usize,
    /// Total deferrals applied across all items.
    pub deferrals: usize,
    /// Loop iterations used.
    pub iterations: usize,
    /// Already-placed items moved later while settling.
    pub shifted: usize,
}

/// Assigns workers to unassigned items without double-booking anyone.
#[derive(Debug, Clone, Copy)]
pub struct AllocationEngine<'a> {
    config: &'a ScheduleConfig,
    calendar: &'a dyn BusinessCalendar,
    max_iterations: usize,
}

struct WorkerBook<'w> {
    worker: &'w Worker,
    /// Lowercased name for tie-breaking.
    sort_name: String,
    /// Indices of items on this worker's calendar.
    items: Vec<usize>,
}

impl<'a> AllocationEngine<'a> {
    /// Creates an engine with the default iteration ceiling.
    pub fn new(config: &'a ScheduleConfig, calendar: &'a dyn BusinessCalendar) -> Self {
        Self {
            config,
            calendar,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Overrides the iteration ceiling.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Allocates workers to every eligible item in `items`.
    ///
    /// Already-assigned items keep their worker and count toward load and
    /// overlap. They only move when a dependency allocated in this run ends
    /// on or after their start.
    ///
    /// # Errors
    /// - [`SchedulingError::NoWorkersAvailable`] if `workers` is empty.
    /// - [`SchedulingError::IterationLimitExceeded`] if items are still
    ///   pending at the ceiling.
    ///
    /// On error `items` is unchanged.
    #[instrument(skip_all, fields(items = items.len(), workers = workers.len()))]
    pub fn allocate(&self, items: &mut [WorkItem], workers: &[Worker]) -> Result<AllocationOutcome> {
        if workers.is_empty() {
            return Err(SchedulingError::NoWorkersAvailable);
        }

        let mut working = items.to_vec();
        let index_by_id: HashMap<&str, usize> = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.id.as_str(), i))
            .rev()
            .collect();

        let mut books: Vec<WorkerBook<'_>> = Vec::with_capacity(workers.len());
        let mut book_by_id: HashMap<&str, usize> = HashMap::new();
        for worker in workers {
            if !book_by_id.contains_key(worker.id.as_str()) {
                book_by_id.insert(worker.id.as_str(), books.len());
                books.push(WorkerBook {
                    worker,
                    sort_name: worker.name.to_lowercase(),
                    items: Vec::new(),
                });
            }
        }
        for (i, item) in items.iter().enumerate() {
            if let Some(&b) = item.assigned_to.as_deref().and_then(|w| book_by_id.get(w)) {
                books[b].items.push(i);
            }
        }

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
        for (i, item) in items.iter().enumerate() {
            for dep in &item.dependencies {
                if let Some(&j) = index_by_id.get(dep.as_str()) {
                    if j != i && !dependents[j].contains(&i) {
                        dependents[j].push(i);
                    }
                }
            }
        }
        let mut placed: Vec<bool> = items
            .iter()
            .map(|item| item.assigned_to.is_some() && item.is_dated())
            .collect();

        let mut eligible: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.assigned_to.is_none() && item.is_dated() && item.effort.is_some())
            .map(|(i, _)| i)
            .collect();
        eligible.sort_by_key(|&i| items[i].start_date);

        let mut outcome = AllocationOutcome::default();
        let mut pending: VecDeque<PendingAllocation> = VecDeque::new();
        let mut fresh = eligible.into_iter();
        let mut next_fresh = fresh.next();

        loop {
            if pending.is_empty() && next_fresh.is_none() {
                break;
            }
            if outcome.iterations >= self.max_iterations {
                let left = pending
                    .iter()
                    .map(|p| p.index)
                    .chain(next_fresh)
                    .chain(fresh)
                    .collect();
                return Err(limit_exceeded(&working, left, outcome.iterations));
            }
            outcome.iterations += 1;

            let current = match pending.pop_front() {
                Some(p) => p,
                None => match next_fresh.take() {
                    Some(index) => {
                        next_fresh = fresh.next();
                        PendingAllocation { index, attempts: 0 }
                    }
                    None => break,
                },
            };

            self.clamp_after_dependencies(&mut working, current.index, &index_by_id);
            let Some((start, end)) = working[current.index].date_range() else {
                continue;
            };

            let chosen = books
                .iter()
                .enumerate()
                .filter(|(_, book)| !book.items.iter().any(|&j| working[j].overlaps(start, end)))
                .min_by(|(_, a), (_, b)| {
                    a.items
                        .len()
                        .cmp(&b.items.len())
                        .then_with(|| a.sort_name.cmp(&b.sort_name))
                        .then_with(|| a.worker.name.cmp(&b.worker.name))
                        .then_with(|| a.worker.id.cmp(&b.worker.id))
                })
                .map(|(b, _)| b);

            match chosen {
                Some(b) => {
                    let worker_id = books[b].worker.id.clone();
                    debug!(
                        item = %working[current.index].id,
                        worker = %worker_id,
                        %start,
                        %end,
                        attempts = current.attempts,
                        "allocated"
                    );
                    working[current.index].assigned_to = Some(worker_id);
                    books[b].items.push(current.index);
                    placed[current.index] = true;
                    outcome.assigned_count += 1;

                    if let Err(unsettled) =
                        self.settle(&mut working, current.index, &placed, &dependents, &mut outcome)
                    {
                        let left = unsettled
                            .into_iter()
                            .chain(pending.iter().map(|p| p.index))
                            .chain(next_fresh)
                            .chain(fresh)
                            .collect();
                        return Err(limit_exceeded(&working, left, outcome.iterations));
                    }
                }
                None => {
                    let shift = current.attempts + 1;
                    let item = &mut working[current.index];
                    let duration = self.duration_of(item, start, end);
                    let new_start = self.calendar.add_business_days(start, shift);
                    let new_end = self
                        .calendar
                        .add_business_days(new_start, duration.saturating_sub(1));
                    debug!(
                        item = %item.id,
                        shift,
                        from = %start,
                        to = %new_start,
                        "no free worker, deferring"
                    );
                    item.start_date = Some(new_start);
                    item.end_date = Some(new_end);
                    item.duration_days = Some(duration);
                    outcome.deferrals += 1;
                    pending.push_back(PendingAllocation {
                        index: current.index,
                        attempts: shift,
                    });
                }
            }
        }

        items.clone_from_slice(&working);
        info!(
            assigned = outcome.assigned_count,
            deferrals = outcome.deferrals,
            iterations = outcome.iterations,
            shifted = outcome.shifted,
            "allocation complete"
        );
        Ok(outcome)
    }

    /// Duration to preserve when shifting an item.
    fn duration_of(&self, item: &WorkItem, start: NaiveDate, end: NaiveDate) -> u32 {
        item.duration_days
            .or_else(|| item.effort.map(|e| self.config.duration_for(e)))
            .unwrap_or_else(|| self.calendar.count_business_days(start, end) + 1)
    }

    /// Moves `index` past its dependencies' current end dates if needed.
    fn clamp_after_dependencies(
        &self,
        working: &mut [WorkItem],
        index: usize,
        index_by_id: &HashMap<&str, usize>,
    ) {
        let bound = working[index]
            .dependencies
            .iter()
            .filter_map(|dep| index_by_id.get(dep.as_str()))
            .filter_map(|&j| working[j].end_date)
            .max()
            .map(|end| self.calendar.add_business_days(end, 1));

        if let (Some(bound), Some(start)) = (bound, working[index].start_date) {
            if start < bound {
                self.shift_to(working, index, bound, "past deferred dependency");
            }
        }
    }

    /// Settles placed items around `moved`, which just got its final dates.
    ///
    /// Placed dependents starting on or before its end move past it; a placed
    /// item on the same worker that collides with it moves past it, or it
    /// moves past the collider when that one started earlier. Every moved
    /// item is settled in turn.
    ///
    /// Returns the items still queued if more than `max_iterations` moves
    /// were needed.
    fn settle(
        &self,
        working: &mut [WorkItem],
        moved: usize,
        placed: &[bool],
        dependents: &[Vec<usize>],
        outcome: &mut AllocationOutcome,
    ) -> std::result::Result<(), Vec<usize>> {
        let mut queue = VecDeque::from([moved]);

        while let Some(m) = queue.pop_front() {
            let Some((start, end)) = working[m].date_range() else {
                continue;
            };

            for &d in &dependents[m] {
                if !placed[d] || working[d].start_date.map_or(true, |s| s > end) {
                    continue;
                }
                if outcome.shifted >= self.max_iterations {
                    queue.push_front(d);
                    return Err(queue.into_iter().collect());
                }
                self.shift_to(working, d, self.calendar.add_business_days(end, 1), "past dependency");
                outcome.shifted += 1;
                queue.push_back(d);
            }

            let Some(worker) = working[m].assigned_to.clone() else {
                continue;
            };
            for j in 0..working.len() {
                if j == m
                    || !placed[j]
                    || working[j].assigned_to.as_deref() != Some(worker.as_str())
                    || !working[j].overlaps(start, end)
                {
                    continue;
                }
                let Some((other_start, other_end)) = working[j].date_range() else {
                    continue;
                };
                if outcome.shifted >= self.max_iterations {
                    queue.push_front(m);
                    return Err(queue.into_iter().collect());
                }
                outcome.shifted += 1;
                if other_start < start {
                    self.shift_to(working, m, self.calendar.add_business_days(other_end, 1), "past booking");
                    queue.push_back(m);
                    break;
                }
                self.shift_to(working, j, self.calendar.add_business_days(end, 1), "past booking");
                queue.push_back(j);
            }
        }

        Ok(())
    }

    /// Moves `index` to start on the first business day on or after
    /// `earliest`, keeping its duration.
    fn shift_to(&self, working: &mut [WorkItem], index: usize, earliest: NaiveDate, reason: &str) {
        let item = &mut working[index];
        let Some((start, end)) = item.date_range() else {
            return;
        };
        let duration = self.duration_of(item, start, end);
        let new_start = self.calendar.next_business_day(earliest);
        debug!(item = %item.id, from = %start, to = %new_start, reason, "shifted");
        item.start_date = Some(new_start);
        item.end_date = Some(
            self.calendar
                .add_business_days(new_start, duration.saturating_sub(1)),
        );
        item.duration_days = Some(duration);
    }
}

fn limit_exceeded(working: &[WorkItem], left: Vec<usize>, iterations: usize) -> SchedulingError {
    let mut pending: Vec<String> = Vec::with_capacity(left.len());
    for index in left {
        let id = &working[index].id;
        if !pending.contains(id) {
            pending.push(id.clone());
        }
    }
    warn!(iterations, pending = pending.len(), "allocation iteration limit reached");
    SchedulingError::IterationLimitExceeded { iterations, pending }
}
