// 📅 Date Codes - legacy spreadsheet day-counts
//
// Registration exports carry birth dates either as "MM/DD/YYYY" text or as
// spreadsheet serials, and the players table stores the serial. The two
// directions use different epochs:
//
//   text → day-count     day 0 = 1899-12-30, +1 before 1900-03-01 (from day 60)
//   day-count → display  day 1 = 1900-01-01
//
// Both must stay as they are: stored data and the source files depend on them.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

// ============================================================================
// DATE CODE
// ============================================================================

/// Result of translating a raw date-of-birth value into a day-count.
///
/// `Invalid` replaces the NaN the legacy format produced for malformed input.
/// It renders as `NaN`, which is what ends up inside identity keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DateCode {
    Serial(f64),
    Invalid,
}

impl DateCode {
    /// Day-count stored for a player (`None` when the date was unusable).
    pub fn from_stored(dob: Option<f64>) -> Self {
        match dob {
            Some(serial) if serial.is_finite() => DateCode::Serial(serial),
            _ => DateCode::Invalid,
        }
    }

    pub fn serial(&self) -> Option<f64> {
        match self {
            DateCode::Serial(serial) => Some(*serial),
            DateCode::Invalid => None,
        }
    }
}

impl fmt::Display for DateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64 Display prints whole numbers without a fraction: 40180, not 40180.0
            DateCode::Serial(serial) => write!(f, "{}", serial),
            DateCode::Invalid => write!(f, "NaN"),
        }
    }
}

// ============================================================================
// EPOCHS
// ============================================================================

fn day_count_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Day before day 1 of the display direction.
fn display_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 31)
}

fn leap_bug_cutoff() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1900, 3, 1)
}

// ============================================================================
// TEXT → DAY-COUNT
// ============================================================================

/// Convert a date-of-birth string into a legacy day-count.
///
/// Numeric input is passed through unchanged. Anything else must be
/// `MM/DD/YYYY`, each part read up to its first non-digit (so a trailing
/// time is ignored); out-of-range months and days roll over into the next
/// month or year, and years 0-99 mean 1900-1999.
///
/// ```
/// use roster_sync::dates::{date_string_to_day_count, DateCode};
///
/// assert_eq!(date_string_to_day_count("01/02/2010"), DateCode::Serial(40180.0));
/// assert_eq!(date_string_to_day_count("40180"), DateCode::Serial(40180.0));
/// assert_eq!(date_string_to_day_count("2010-01-02"), DateCode::Invalid);
/// ```
pub fn date_string_to_day_count(input: &str) -> DateCode {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return DateCode::Invalid;
    }

    if let Ok(serial) = trimmed.parse::<f64>() {
        // "NaN" and "inf" parse as floats too
        return if serial.is_finite() {
            DateCode::Serial(serial)
        } else {
            DateCode::Invalid
        };
    }

    let parts: Vec<&str> = trimmed.split('/').collect();
    if parts.len() != 3 {
        return DateCode::Invalid;
    }

    let (Some(month), Some(day), Some(year)) = (
        leading_int(parts[0]),
        leading_int(parts[1]),
        leading_int(parts[2]),
    ) else {
        return DateCode::Invalid;
    };

    match calendar_date(year, month, day) {
        Some(date) => day_count_for(date),
        None => DateCode::Invalid,
    }
}

/// Integer at the start of a segment, ignoring anything after it:
/// `"2010 12:00:00 AM"` reads as 2010.
fn leading_int(segment: &str) -> Option<i64> {
    let segment = segment.trim_start();
    let (sign, rest) = match segment.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, segment.strip_prefix('+').unwrap_or(segment)),
    };

    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }

    rest[..digits].parse::<i64>().ok().map(|n| sign * n)
}

/// Build a calendar date the lenient way: month 13 is January of the next
/// year, day 0 is the last day of the previous month.
fn calendar_date(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    let year = if (0..=99).contains(&year) { year + 1900 } else { year };

    let months = year.checked_mul(12)?.checked_add(month.checked_sub(1)?)?;
    let first_of_month = NaiveDate::from_ymd_opt(
        i32::try_from(months.div_euclid(12)).ok()?,
        u32::try_from(months.rem_euclid(12) + 1).ok()?,
        1,
    )?;

    first_of_month.checked_add_signed(Duration::try_days(day.checked_sub(1)?)?)
}

/// Day-count of a calendar date, including the 1900 leap-year correction.
pub fn day_count_for(date: NaiveDate) -> DateCode {
    let (Some(epoch), Some(cutoff)) = (day_count_epoch(), leap_bug_cutoff()) else {
        return DateCode::Invalid;
    };

    let mut count = (date - epoch).num_days();
    if count >= 60 && date < cutoff {
        count += 1;
    }

    DateCode::Serial(count as f64)
}

// ============================================================================
// DAY-COUNT → DISPLAY / TIMESTAMP
// ============================================================================

/// Render a stored day-count as `MM/DD/YYYY` (day 1 = 1900-01-01).
///
/// Fractions are dropped. Returns `None` for values chrono cannot place.
pub fn day_count_to_display(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }

    let days = Duration::try_days(serial.floor() as i64)?;
    let date = display_epoch()?.checked_add_signed(days)?;

    Some(date.format("%m/%d/%Y").to_string())
}

/// Date-time for a fractional serial, measured from 1899-12-30.
///
/// Rounded to the millisecond first, then truncated to whole seconds.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let millis = (serial * MILLIS_PER_DAY).round();
    // keeps the i64 cast and the chrono range honest
    if !millis.is_finite() || millis.abs() > 1e17 {
        return None;
    }

    let seconds = (millis as i64).div_euclid(1000);
    let epoch = day_count_epoch()?.and_hms_opt(0, 0, 0)?;

    epoch.checked_add_signed(Duration::try_seconds(seconds)?)
}

/// `YYYY-MM-DD HH:MM:SS` for a fractional serial (order dates and the like).
pub fn serial_to_timestamp(serial: f64) -> Option<String> {
    serial_to_datetime(serial).map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
}

// ============================================================================
// TESTS
// ============================================================================
