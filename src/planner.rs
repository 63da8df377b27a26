//! Planning entry points and backlog store contracts.
//!
//! [`Planner`] exposes the three operations a surrounding application calls:
//!
//! | Operation | Stages |
//! |-----------|--------|
//! | [`Planner::validate_dependency`] | hypothetical cycle check |
//! | [`Planner::compute_schedule`] | validate → order → date |
//! | [`Planner::allocate_workers`] | allocate → idleness |
//!
//! [`Planner::plan`] chains all of them against a store that implements
//! [`BacklogSource`] and [`BacklogSink`].
//!
//! The planner holds no state between calls besides its own settings.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{Result, SchedulingError};
use crate::models::{BusinessCalendar, IdlenessWarning, ScheduleConfig, WorkCalendar, WorkItem, Worker};
use crate::scheduler::{
    AllocationEngine, BacklogOrderer, IdlenessAnalyzer, RoadmapKpi, ScheduleCalculator,
    DEFAULT_MAX_ITERATIONS,
};
use crate::validation::{self, ValidationErrorKind};

/// Read side of a backlog store.
pub trait BacklogSource {
    /// All work items.
    fn list_items(&self) -> Result<Vec<WorkItem>>;
    /// All workers.
    fn list_workers(&self) -> Result<Vec<Worker>>;
    /// Current schedule configuration.
    fn schedule_config(&self) -> Result<ScheduleConfig>;
}

/// Write side of a backlog store.
pub trait BacklogSink {
    /// Persists the schedule fields of `items`.
    fn save_items(&mut self, items: &[WorkItem]) -> Result<()>;
}

/// A store kept entirely in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InMemoryBacklog {
    /// Work items, replaced wholesale on save.
    pub items: Vec<WorkItem>,
    /// Worker pool.
    pub workers: Vec<Worker>,
    /// Schedule configuration returned to the planner.
    pub config: ScheduleConfig,
}

impl InMemoryBacklog {
    /// Creates an empty backlog with `config`.
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            items: Vec::new(),
            workers: Vec::new(),
            config,
        }
    }

    /// Adds a work item.
    pub fn with_item(mut self, item: WorkItem) -> Self {
        self.items.push(item);
        self
    }

    /// Adds a worker.
    pub fn with_worker(mut self, worker: Worker) -> Self {
        self.workers.push(worker);
        self
    }

    /// Finds an item by ID.
    pub fn item(&self, id: &str) -> Option<&WorkItem> {
        self.items.iter().find(|i| i.id == id)
    }
}

impl BacklogSource for InMemoryBacklog {
    fn list_items(&self) -> Result<Vec<WorkItem>> {
        Ok(self.items.clone())
    }

    fn list_workers(&self) -> Result<Vec<Worker>> {
        Ok(self.workers.clone())
    }

    fn schedule_config(&self) -> Result<ScheduleConfig> {
        Ok(self.config.clone())
    }
}

impl BacklogSink for InMemoryBacklog {
    fn save_items(&mut self, items: &[WorkItem]) -> Result<()> {
        self.items = items.to_vec();
        Ok(())
    }
}

/// Result of [`Planner::allocate_workers`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationReport {
    /// Items that received a worker.
    pub assigned_count: usize,
    /// Deferrals applied while looking for free workers.
    pub deferrals: usize,
    /// Allocation loop iterations used.
    pub iterations: usize,
    /// Already-assigned items moved later to stay after their dependencies.
    pub shifted: usize,
    /// Idle gaps on worker calendars after allocation.
    pub warnings: Vec<IdlenessWarning>,
}

/// Result of [`Planner::plan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    /// Item IDs in execution order.
    pub order: Vec<String>,
    /// Allocation summary and idleness warnings.
    pub allocation: AllocationReport,
    /// Roadmap metrics over the saved items.
    pub kpi: RoadmapKpi,
}

/// Backlog planner bound to one business calendar.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use u_backlog::models::{EffortSize, ScheduleConfig, WorkItem, Worker};
/// use u_backlog::planner::Planner;
///
/// let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
/// let planner = Planner::new().with_today(monday);
/// let config = ScheduleConfig::new(10, 10).unwrap();
///
/// let items = vec![
///     WorkItem::new("api").with_effort(EffortSize::Three),
///     WorkItem::new("ui").with_effort(EffortSize::Two).with_dependency("api"),
/// ];
/// let mut dated = planner.compute_schedule(&items, &config, None).unwrap();
/// let report = planner
///     .allocate_workers(&mut dated, &[Worker::new("ana")], &config)
///     .unwrap();
///
/// assert_eq!(report.assigned_count, 2);
/// assert_eq!(dated[1].start_date, NaiveDate::from_ymd_opt(2025, 1, 9));
/// ```
#[derive(Debug, Clone)]
pub struct Planner<C = WorkCalendar> {
    calendar: C,
    max_iterations: usize,
    today: Option<NaiveDate>,
}

impl Planner<WorkCalendar> {
    /// Creates a planner over the national holiday calendar.
    pub fn new() -> Self {
        Self::with_calendar(WorkCalendar::new())
    }
}

impl Default for Planner<WorkCalendar> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: BusinessCalendar> Planner<C> {
    /// Creates a planner over `calendar`.
    pub fn with_calendar(calendar: C) -> Self {
        Self {
            calendar,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            today: None,
        }
    }

    /// Sets the allocation iteration ceiling.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Fixes the date used as "today" when no start is configured.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// The calendar used for all date arithmetic.
    pub fn calendar(&self) -> &C {
        &self.calendar
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Checks whether "`from_id` depends on `to_id`" can be added without
    /// closing a cycle. See [`validation::validate_dependency`].
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub fn validate_dependency(&self, items: &[WorkItem], from_id: &str, to_id: &str) -> Result<()> {
        validation::validate_dependency(items, from_id, to_id)
    }

    /// Orders and dates a backlog.
    ///
    /// Returns copies of `items` in execution order with durations and
    /// start/end dates filled in. Items without an effort estimate are
    /// ordered but left undated.
    ///
    /// The effective start is `start_override`, else the configured roadmap
    /// start, else today; rolled forward to a business day.
    ///
    /// # Errors
    /// - [`SchedulingError::InvalidConfig`] for a bad configuration.
    /// - [`SchedulingError::InvalidBacklog`] for duplicate IDs or unknown
    ///   dependencies.
    /// - [`SchedulingError::CyclicDependency`] with the offending path.
    #[instrument(skip_all, fields(items = items.len()))]
    pub fn compute_schedule(
        &self,
        items: &[WorkItem],
        config: &ScheduleConfig,
        start_override: Option<NaiveDate>,
    ) -> Result<Vec<WorkItem>> {
        config.validate(&self.calendar)?;

        if let Err(errors) = validation::validate_backlog(items) {
            let structural: Vec<_> = errors
                .into_iter()
                .filter(|e| e.kind != ValidationErrorKind::CyclicDependency)
                .collect();
            if !structural.is_empty() {
                return Err(SchedulingError::InvalidBacklog(structural));
            }
        }
        validation::ensure_acyclic(items)?;

        let mut ordered = BacklogOrderer::new().order(items)?;
        let calculator = ScheduleCalculator::new(config, &self.calendar);
        let start = calculator.resolve_start(start_override, self.today());
        calculator.schedule(&mut ordered, start);

        info!(
            items = ordered.len(),
            dated = ordered.iter().filter(|i| i.is_dated()).count(),
            %start,
            "schedule computed"
        );
        Ok(ordered)
    }

    /// Assigns workers to dated, unassigned items and reports idle gaps.
    ///
    /// `items` is updated in place only on success.
    ///
    /// # Errors
    /// - [`SchedulingError::NoWorkersAvailable`] if `workers` is empty.
    /// - [`SchedulingError::IterationLimitExceeded`] if the iteration ceiling
    ///   is hit with items still pending.
    #[instrument(skip_all, fields(items = items.len(), workers = workers.len()))]
    pub fn allocate_workers(
        &self,
        items: &mut [WorkItem],
        workers: &[Worker],
        config: &ScheduleConfig,
    ) -> Result<AllocationReport> {
        let outcome = AllocationEngine::new(config, &self.calendar)
            .with_max_iterations(self.max_iterations)
            .allocate(items, workers)?;
        let warnings = IdlenessAnalyzer::new(&self.calendar).analyze(items);

        info!(
            assigned = outcome.assigned_count,
            warnings = warnings.len(),
            "workers allocated"
        );
        Ok(AllocationReport {
            assigned_count: outcome.assigned_count,
            deferrals: outcome.deferrals,
            iterations: outcome.iterations,
            shifted: outcome.shifted,
            warnings,
        })
    }

    /// Plans a whole store: schedule, allocate, save.
    ///
    /// Nothing is saved if any stage fails.
    #[instrument(skip_all)]
    pub fn plan<S>(&self, store: &mut S, start_override: Option<NaiveDate>) -> Result<PlanReport>
    where
        S: BacklogSource + BacklogSink,
    {
        let items = store.list_items()?;
        let workers = store.list_workers()?;
        let config = store.schedule_config()?;

        let mut ordered = self.compute_schedule(&items, &config, start_override)?;
        let allocation = self.allocate_workers(&mut ordered, &workers, &config)?;
        let kpi = RoadmapKpi::calculate(&ordered, &workers, &self.calendar);

        store.save_items(&ordered)?;

        Ok(PlanReport {
            order: ordered.into_iter().map(|i| i.id).collect(),
            allocation,
            kpi,
        })
    }
}
