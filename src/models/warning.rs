//! Post-allocation findings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A run of idle business days between two consecutive items on one
/// worker's calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdlenessWarning {
    /// Worker with the gap.
    pub worker_id: String,
    /// Idle business days (>= 1).
    pub gap_days: u32,
    /// Item finishing right before the gap.
    pub previous_item_id: String,
    /// Item starting right after the gap.
    pub next_item_id: String,
    /// First idle business day.
    pub gap_start: NaiveDate,
    /// Last idle business day.
    pub gap_end: NaiveDate,
}

impl fmt::Display for IdlenessWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "worker '{}' idle for {} business day(s) from {} to {} (between '{}' and '{}')",
            self.worker_id,
            self.gap_days,
            self.gap_start,
            self.gap_end,
            self.previous_item_id,
            self.next_item_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let w = IdlenessWarning {
            worker_id: "w1".into(),
            gap_days: 2,
            previous_item_id: "A".into(),
            next_item_id: "B".into(),
            gap_start: NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
            gap_end: NaiveDate::from_ymd_opt(2025, 1, 9).unwrap(),
        };
        assert_eq!(
            w.to_string(),
            "worker 'w1' idle for 2 business day(s) from 2025-01-08 to 2025-01-09 (between 'A' and 'B')"
        );
    }
}
