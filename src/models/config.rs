//! Schedule configuration.
//!
//! Team throughput is expressed per cycle (sprint): how many effort units get
//! done and how many business days a cycle lasts. Velocity is the ratio.
//!
//! # TOML form
//! ```toml
//! effort_units_per_cycle = 21
//! business_days_per_cycle = 15
//! roadmap_start = "2025-01-06"   # optional
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BusinessCalendar, EffortSize};
use crate::error::{Result, SchedulingError};

/// Read-only planning parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Effort units completed per cycle (> 0).
    pub effort_units_per_cycle: u32,
    /// Business days in one cycle (> 0).
    pub business_days_per_cycle: u32,
    /// Configured roadmap start. Must be a business day when set.
    #[serde(default)]
    pub roadmap_start: Option<NaiveDate>,
}

impl ScheduleConfig {
    /// Creates a configuration, rejecting zero counts.
    pub fn new(effort_units_per_cycle: u32, business_days_per_cycle: u32) -> Result<Self> {
        let config = Self {
            effort_units_per_cycle,
            business_days_per_cycle,
            roadmap_start: None,
        };
        config.validate_counts()?;
        Ok(config)
    }

    /// Sets the configured roadmap start.
    pub fn with_roadmap_start(mut self, start: NaiveDate) -> Self {
        self.roadmap_start = Some(start);
        self
    }

    /// Parses a configuration from TOML and checks the cycle counts.
    ///
    /// The roadmap start is checked separately by [`validate`](Self::validate)
    /// because that needs a calendar.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate_counts()?;
        Ok(config)
    }

    /// Full validation: positive counts and a business-day roadmap start.
    pub fn validate(&self, calendar: &dyn BusinessCalendar) -> Result<()> {
        self.validate_counts()?;
        if let Some(start) = self.roadmap_start {
            if !calendar.is_business_day(start) {
                return Err(SchedulingError::InvalidConfig(format!(
                    "roadmap start {start} is not a business day"
                )));
            }
        }
        Ok(())
    }

    fn validate_counts(&self) -> Result<()> {
        if self.effort_units_per_cycle == 0 {
            return Err(SchedulingError::InvalidConfig(
                "effort_units_per_cycle must be greater than zero".into(),
            ));
        }
        if self.business_days_per_cycle == 0 {
            return Err(SchedulingError::InvalidConfig(
                "business_days_per_cycle must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Effort units completed per business day.
    pub fn velocity(&self) -> f64 {
        self.effort_units_per_cycle as f64 / self.business_days_per_cycle as f64
    }

    /// Business days needed for `effort`: `ceil(units / velocity)`, at least 1.
    ///
    /// Computed in integers as `ceil(units * days / units_per_cycle)` so
    /// exact multiples never round up through float error.
    pub fn duration_for(&self, effort: EffortSize) -> u32 {
        let units = u64::from(effort.units());
        let days = u64::from(self.business_days_per_cycle);
        let per_cycle = u64::from(self.effort_units_per_cycle.max(1));
        let duration = (units * days).div_ceil(per_cycle);
        u32::try_from(duration).unwrap_or(u32::MAX).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeekendCalendar;

    #[test]
    fn test_velocity() {
        let config = ScheduleConfig::new(21, 15).unwrap();
        assert!((config.velocity() - 1.4).abs() < 1e-10);
    }

    #[test]
    fn test_duration_example() {
        // 8 / 1.4 = 5.71 -> 6
        let config = ScheduleConfig::new(21, 15).unwrap();
        assert_eq!(config.duration_for(EffortSize::Eight), 6);
    }

    #[test]
    fn test_duration_exact_multiple() {
        // 21 / 1.4 = 15 exactly
        let config = ScheduleConfig::new(21, 15).unwrap();
        assert_eq!(config.duration_for(EffortSize::TwentyOne), 15);
    }

    #[test]
    fn test_duration_minimum_one() {
        // velocity 10/day, 1 point -> 0.1 -> at least 1 day
        let config = ScheduleConfig::new(100, 10).unwrap();
        assert_eq!(config.duration_for(EffortSize::One), 1);
    }

    #[test]
    fn test_zero_counts_rejected() {
        assert!(ScheduleConfig::new(0, 10).is_err());
        assert!(ScheduleConfig::new(10, 0).is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = ScheduleConfig::from_toml_str(
            r#"
            effort_units_per_cycle = 21
            business_days_per_cycle = 15
            roadmap_start = "2025-01-06"
            "#,
        )
        .unwrap();
        assert_eq!(config.effort_units_per_cycle, 21);
        assert_eq!(config.roadmap_start, NaiveDate::from_ymd_opt(2025, 1, 6));
    }

    #[test]
    fn test_from_toml_errors() {
        let parse = ScheduleConfig::from_toml_str("effort_units_per_cycle = \"x\"");
        assert!(matches!(parse, Err(SchedulingError::ConfigParse(_))));

        let zero = ScheduleConfig::from_toml_str(
            "effort_units_per_cycle = 0\nbusiness_days_per_cycle = 5",
        );
        assert!(matches!(zero, Err(SchedulingError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_start_must_be_business_day() {
        let cal = WeekendCalendar;
        let saturday = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();
        let monday = NaiveDate::from_ymd_opt(2025, 1, 13).unwrap();

        let bad = ScheduleConfig::new(10, 10).unwrap().with_roadmap_start(saturday);
        assert!(matches!(bad.validate(&cal), Err(SchedulingError::InvalidConfig(_))));

        let good = ScheduleConfig::new(10, 10).unwrap().with_roadmap_start(monday);
        assert!(good.validate(&cal).is_ok());
    }
}
