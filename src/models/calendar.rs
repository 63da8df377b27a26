//! Business-day calendars.
//!
//! Dates are plain calendar days ([`NaiveDate`]). A business day is a weekday
//! that is not a holiday. All arithmetic here is total: no operation fails for
//! a valid date, and iteration saturates at [`NaiveDate::MAX`].
//!
//! # Holiday table
//! [`WorkCalendar`] carries a static national holiday table identified by
//! [`HOLIDAY_TABLE_VERSION`]. Fixed holidays fall on the same month/day each
//! year; movable holidays are offsets from Easter Sunday.
//!
//! # Reference
//! Meeus (1991), "Astronomical Algorithms", Ch. 8 (Gregorian Easter)

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Version tag of the built-in holiday table.
///
/// Bumped whenever a holiday is added or removed, so persisted schedules can
/// record which table produced them.
pub const HOLIDAY_TABLE_VERSION: &str = "br-2024.1";

/// Calendar arithmetic over business days.
///
/// Implementors only decide which days are business days; stepping and
/// counting come for free.
pub trait BusinessCalendar: Debug + Send + Sync {
    /// Whether `date` is a business day.
    fn is_business_day(&self, date: NaiveDate) -> bool;

    /// Advances `date` by `n` business days.
    ///
    /// With `n == 0` a business day is returned unchanged and a non-business
    /// day rolls forward to the next business day. With `n > 0` the result
    /// is always a business day strictly after `date`.
    fn add_business_days(&self, date: NaiveDate, n: u32) -> NaiveDate {
        let mut current = date;
        if n == 0 {
            while !self.is_business_day(current) {
                match current.succ_opt() {
                    Some(next) => current = next,
                    None => return current,
                }
            }
            return current;
        }

        let mut remaining = n;
        while remaining > 0 {
            match current.succ_opt() {
                Some(next) => current = next,
                None => return current,
            }
            if self.is_business_day(current) {
                remaining -= 1;
            }
        }
        current
    }

    /// Counts business days in `(start_exclusive, end_inclusive]`.
    ///
    /// Returns 0 when `end_inclusive <= start_exclusive`.
    fn count_business_days(&self, start_exclusive: NaiveDate, end_inclusive: NaiveDate) -> u32 {
        if end_inclusive <= start_exclusive {
            return 0;
        }
        start_exclusive
            .iter_days()
            .skip(1)
            .take_while(|d| *d <= end_inclusive)
            .filter(|d| self.is_business_day(*d))
            .count() as u32
    }

    /// First business day on or after `date`.
    fn next_business_day(&self, date: NaiveDate) -> NaiveDate {
        self.add_business_days(date, 0)
    }

    /// Last business day strictly before `date`.
    fn previous_business_day(&self, date: NaiveDate) -> NaiveDate {
        let mut current = date;
        loop {
            match current.pred_opt() {
                Some(prev) => current = prev,
                None => return current,
            }
            if self.is_business_day(current) {
                return current;
            }
        }
    }
}

/// Whether `date` falls on Saturday or Sunday.
#[inline]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Calendar with weekends as the only non-business days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekendCalendar;

impl BusinessCalendar for WeekendCalendar {
    fn is_business_day(&self, date: NaiveDate) -> bool {
        !is_weekend(date)
    }
}

/// A named holiday on a concrete date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Holiday {
    /// Holiday name.
    pub name: &'static str,
    /// Date the holiday falls on.
    pub date: NaiveDate,
}

struct FixedHoliday {
    name: &'static str,
    month: u32,
    day: u32,
    /// First year the holiday is observed.
    since: Option<i32>,
}

struct MovableHoliday {
    name: &'static str,
    /// Offset in calendar days from Easter Sunday.
    easter_offset: i64,
}

const FIXED_HOLIDAYS: &[FixedHoliday] = &[
    FixedHoliday { name: "New Year's Day", month: 1, day: 1, since: None },
    FixedHoliday { name: "Tiradentes", month: 4, day: 21, since: None },
    FixedHoliday { name: "Labour Day", month: 5, day: 1, since: None },
    FixedHoliday { name: "Independence Day", month: 9, day: 7, since: None },
    FixedHoliday { name: "Our Lady of Aparecida", month: 10, day: 12, since: None },
    FixedHoliday { name: "All Souls' Day", month: 11, day: 2, since: None },
    FixedHoliday { name: "Republic Proclamation Day", month: 11, day: 15, since: None },
    FixedHoliday { name: "Black Consciousness Day", month: 11, day: 20, since: Some(2024) },
    FixedHoliday { name: "Christmas Day", month: 12, day: 25, since: None },
];

const MOVABLE_HOLIDAYS: &[MovableHoliday] = &[
    MovableHoliday { name: "Carnival Monday", easter_offset: -48 },
    MovableHoliday { name: "Carnival Tuesday", easter_offset: -47 },
    MovableHoliday { name: "Good Friday", easter_offset: -2 },
    MovableHoliday { name: "Corpus Christi", easter_offset: 60 },
];

/// Easter Sunday for a Gregorian year (anonymous Gregorian algorithm).
///
/// Returns `None` only for years outside chrono's representable range.
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b.div_euclid(4);
    let e = b.rem_euclid(4);
    let f = (b + 8).div_euclid(25);
    let g = (b - f + 1).div_euclid(3);
    let h = (19 * a + b - d - g + 15).rem_euclid(30);
    let i = c.div_euclid(4);
    let k = c.rem_euclid(4);
    let l = (32 + 2 * e + 2 * i - h - k).rem_euclid(7);
    let m = (a + 11 * h + 22 * l).div_euclid(451);
    let month = (h + l - 7 * m + 114).div_euclid(31);
    let day = (h + l - 7 * m + 114).rem_euclid(31) + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

fn offset_days(date: NaiveDate, offset: i64) -> Option<NaiveDate> {
    let days = Days::new(offset.unsigned_abs());
    if offset >= 0 {
        date.checked_add_days(days)
    } else {
        date.checked_sub_days(days)
    }
}

/// The default business calendar: weekends plus the national holiday table.
///
/// The table is static and not user-configurable; see
/// [`HOLIDAY_TABLE_VERSION`].
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use u_backlog::models::{BusinessCalendar, WorkCalendar};
///
/// let cal = WorkCalendar::new();
/// let christmas = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
/// assert!(!cal.is_business_day(christmas));
/// // Wed 24th + 1 business day skips the holiday and lands on Fri 26th.
/// let eve = NaiveDate::from_ymd_opt(2025, 12, 24).unwrap();
/// assert_eq!(cal.add_business_days(eve, 1), NaiveDate::from_ymd_opt(2025, 12, 26).unwrap());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendar;

impl WorkCalendar {
    /// Creates the national-holiday calendar.
    pub fn new() -> Self {
        Self
    }

    /// Version tag of the holiday table in use.
    pub fn table_version(&self) -> &'static str {
        HOLIDAY_TABLE_VERSION
    }

    /// All holidays observed in `year`, sorted by date.
    pub fn holidays(&self, year: i32) -> Vec<Holiday> {
        let mut holidays: Vec<Holiday> = FIXED_HOLIDAYS
            .iter()
            .filter(|h| h.since.map_or(true, |since| year >= since))
            .filter_map(|h| {
                NaiveDate::from_ymd_opt(year, h.month, h.day).map(|date| Holiday { name: h.name, date })
            })
            .collect();

        if let Some(easter) = easter_sunday(year) {
            holidays.extend(MOVABLE_HOLIDAYS.iter().filter_map(|h| {
                offset_days(easter, h.easter_offset).map(|date| Holiday { name: h.name, date })
            }));
        }

        holidays.sort_by_key(|h| h.date);
        holidays
    }

    /// Whether `date` is in the holiday table.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        let year = date.year();
        let fixed = FIXED_HOLIDAYS.iter().any(|h| {
            h.month == date.month()
                && h.day == date.day()
                && h.since.map_or(true, |since| year >= since)
        });
        if fixed {
            return true;
        }

        match easter_sunday(year) {
            Some(easter) => MOVABLE_HOLIDAYS
                .iter()
                .any(|h| offset_days(easter, h.easter_offset) == Some(date)),
            None => false,
        }
    }
}

impl BusinessCalendar for WorkCalendar {
    fn is_business_day(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && !self.is_holiday(date)
    }
}
