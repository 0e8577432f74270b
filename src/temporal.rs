// ⏰ Weekly Epoch - What "this week" means
// The game resets weekly content every Tuesday at 15:00 UTC.
//
// A WeekId names the most recent reset boundary as `YYYYMMDD`. Weekly
// fields on a record are only meaningful while their WeekId matches the
// current one; comparison is plain string equality.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const RESET_WEEKDAY: Weekday = Weekday::Tue;
pub const RESET_HOUR: u32 = 15;

// ============================================================================
// WEEK ID
// ============================================================================

/// WeekId - `YYYYMMDD` of the reset boundary that opened the week
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekId(String);

impl WeekId {
    pub fn new(id: impl Into<String>) -> Self {
        WeekId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Eight digits forming a real calendar date
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 8
            && self.0.bytes().all(|b| b.is_ascii_digit())
            && NaiveDate::parse_from_str(&self.0, "%Y%m%d").is_ok()
    }

    /// True when `other` names the same epoch
    pub fn matches(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<WeekId> for String {
    fn from(id: WeekId) -> Self {
        id.0
    }
}

// ============================================================================
// BOUNDARY ARITHMETIC
// ============================================================================

/// Most recent reset at or before `instant`
///
/// Exactly 15:00:00 on reset day belongs to the new week; any earlier
/// instant that Tuesday still belongs to the previous one.
pub fn reset_boundary(instant: DateTime<Utc>) -> DateTime<Utc> {
    let weekday = instant.weekday().num_days_from_monday();
    let reset = RESET_WEEKDAY.num_days_from_monday();

    let mut days_since_reset = (weekday + 7 - reset) % 7;
    if days_since_reset == 0 && instant.hour() < RESET_HOUR {
        days_since_reset = 7;
    }

    let date = instant.date_naive() - Duration::days(i64::from(days_since_reset));
    let naive = date.and_time(NaiveTime::default()) + Duration::hours(i64::from(RESET_HOUR));
    Utc.from_utc_datetime(&naive)
}

/// First reset strictly after `instant`
pub fn next_reset(instant: DateTime<Utc>) -> DateTime<Utc> {
    reset_boundary(instant) + Duration::days(7)
}

pub fn week_id_for(instant: DateTime<Utc>) -> WeekId {
    WeekId(reset_boundary(instant).format("%Y%m%d").to_string())
}

// ============================================================================
// CLOCK
// ============================================================================

/// Source of "now", injected wherever the current week matters
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant (tests, `week --at`)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at(instant: DateTime<Utc>) -> Self {
        FixedClock(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn current_week_id(clock: &dyn Clock) -> WeekId {
    week_id_for(clock.now())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_week_id_after_reset() {
        // 2024-12-24 is a Tuesday
        assert_eq!(week_id_for(utc(2024, 12, 24, 16, 0, 0)).as_str(), "20241224");
        assert_eq!(week_id_for(utc(2024, 12, 25, 9, 30, 0)).as_str(), "20241224");
        assert_eq!(week_id_for(utc(2024, 12, 30, 23, 59, 59)).as_str(), "20241224");

        println!("✅ Week id after reset test passed");
    }

    #[test]
    fn test_tuesday_before_reset_is_previous_week() {
        assert_eq!(week_id_for(utc(2024, 12, 24, 14, 0, 0)).as_str(), "20241217");
        assert_eq!(week_id_for(utc(2024, 12, 24, 0, 0, 0)).as_str(), "20241217");
        assert_eq!(week_id_for(utc(2024, 12, 31, 14, 59, 59)).as_str(), "20241224");
    }

    #[test]
    fn test_boundary_is_exact() {
        let reset = utc(2024, 12, 24, 15, 0, 0);
        let just_before = reset - Duration::nanoseconds(1);

        assert_eq!(week_id_for(utc(2024, 12, 24, 14, 59, 59)), week_id_for(just_before));
        assert_ne!(week_id_for(just_before), week_id_for(reset));
        assert_eq!(week_id_for(reset).as_str(), "20241224");

        println!("✅ Reset boundary exactness test passed");
    }

    #[test]
    fn test_week_crosses_month_and_year() {
        // Monday 2025-01-06 belongs to the week opened Tuesday 2024-12-31
        assert_eq!(week_id_for(utc(2025, 1, 6, 12, 0, 0)).as_str(), "20241231");
        assert_eq!(week_id_for(utc(2024, 3, 1, 12, 0, 0)).as_str(), "20240227");
    }

    #[test]
    fn test_reset_boundary_and_next_reset() {
        let instant = utc(2024, 12, 27, 8, 15, 42);
        assert_eq!(reset_boundary(instant), utc(2024, 12, 24, 15, 0, 0));
        assert_eq!(next_reset(instant), utc(2024, 12, 31, 15, 0, 0));

        let on_boundary = utc(2024, 12, 24, 15, 0, 0);
        assert_eq!(reset_boundary(on_boundary), on_boundary);
        assert_eq!(next_reset(on_boundary), utc(2024, 12, 31, 15, 0, 0));
    }

    #[test]
    fn test_every_day_of_a_week_maps_to_one_id() {
        let start = utc(2024, 12, 24, 15, 0, 0);
        for hours in 0..(7 * 24) {
            let instant = start + Duration::hours(hours);
            assert_eq!(week_id_for(instant).as_str(), "20241224", "hour offset {}", hours);
        }
    }

    #[test]
    fn test_clock_injection() {
        let clock = FixedClock::at(utc(2024, 12, 20, 10, 0, 0));
        assert_eq!(current_week_id(&clock).as_str(), "20241217");

        let live = current_week_id(&SystemClock);
        assert!(live.is_well_formed());
    }

    #[test]
    fn test_week_id_well_formed() {
        assert!(WeekId::new("20241224").is_well_formed());
        assert!(!WeekId::new("2024122").is_well_formed());
        assert!(!WeekId::new("2024-12-2").is_well_formed());
        assert!(!WeekId::new("20241332").is_well_formed());
        assert!(!WeekId::new("").is_well_formed());
        assert!(WeekId::new("20241224").matches("20241224"));
        assert!(!WeekId::new("20241224").matches("20241217"));
    }
}
