//! Calendar math for Monday-aligned weeks.
//!
//! Dates are plain calendar dates ([`NaiveDate`]); there is no time of day
//! or zone, so "which day" never shifts with daylight saving. "Today" is the
//! UTC calendar date.

use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};

use crate::error::PlanError;

/// Number of days in a plan.
pub const DAYS_PER_WEEK: usize = 7;

/// Parse a strict `YYYY-MM-DD` calendar date.
///
/// Rejects anything that is not exactly four digits, dash, two digits,
/// dash, two digits, as well as impossible dates such as `2023-02-29`.
pub fn parse_calendar_date(s: &str) -> Result<NaiveDate, PlanError> {
    let invalid = || PlanError::InvalidDate(s.to_owned());

    let bytes = s.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(invalid());
    }

    // The shape check guarantees these slices are ASCII digits.
    let year: i32 = s[0..4].parse().map_err(|_| invalid())?;
    let month: u32 = s[5..7].parse().map_err(|_| invalid())?;
    let day: u32 = s[8..10].parse().map_err(|_| invalid())?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
    if format_calendar_date(date) != s {
        return Err(invalid());
    }
    Ok(date)
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// The Monday on or before `date`.
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_monday();
    date - Days::new(u64::from(back))
}

/// The seven consecutive dates starting at `week_start`.
pub fn dates_of_week(week_start: NaiveDate) -> [NaiveDate; DAYS_PER_WEEK] {
    std::array::from_fn(|i| week_start + Days::new(i as u64))
}

/// Resolve an optional `start` parameter to a week start.
///
/// A missing or empty parameter means the week containing `today`. A
/// present parameter must be a valid calendar date; it is normalized to the
/// Monday of its week.
pub fn parse_week_start(param: Option<&str>, today: NaiveDate) -> Result<NaiveDate, PlanError> {
    match param.filter(|s| !s.is_empty()) {
        None => Ok(week_start_of(today)),
        Some(s) => parse_calendar_date(s).map(week_start_of),
    }
}

/// Today's UTC calendar date.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// English weekday name, e.g. `"Monday"`.
pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
