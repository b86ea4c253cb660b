//! Calendar arithmetic shared by the recognition strategies.
//!
//! Everything here works on [`NaiveDate`] values: a time intent only carries
//! day granularity, so time-of-day never enters the arithmetic. Every helper
//! returns a fresh value; dates at the edge of the representable calendar
//! yield `None` rather than panicking.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::IntentError;

// ── Configurable week start ─────────────────────────────────────────────────

/// Which day begins a week for week windows ("this week", "week of May 12", ...).
///
/// Does **not** affect named-weekday expressions like "next Friday".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    /// ISO 8601 standard (Monday = day 0 of the week).
    #[default]
    Monday,
    /// US/Canada convention (Sunday = day 0 of the week).
    Sunday,
}

impl WeekStart {
    /// The weekday every week window starts on.
    pub fn weekday(self) -> Weekday {
        match self {
            WeekStart::Monday => Weekday::Mon,
            WeekStart::Sunday => Weekday::Sun,
        }
    }
}

impl FromStr for WeekStart {
    type Err = IntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" => Ok(WeekStart::Monday),
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            _ => Err(IntentError::InvalidWeekStart(format!("'{}'", s.trim()))),
        }
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekStart::Monday => f.write_str("monday"),
            WeekStart::Sunday => f.write_str("sunday"),
        }
    }
}

/// How many days `weekday` is from the week-start day.
fn days_from_week_start(weekday: Weekday, week_start: WeekStart) -> i64 {
    match week_start {
        WeekStart::Monday => weekday.num_days_from_monday() as i64,
        WeekStart::Sunday => weekday.num_days_from_sunday() as i64,
    }
}

// ── Day and week arithmetic ─────────────────────────────────────────────────

/// Shift a date by a signed number of days.
pub fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::try_days(days)?)
}

/// The first day of the week containing `date`.
pub fn start_of_week(date: NaiveDate, week_start: WeekStart) -> Option<NaiveDate> {
    shift_days(date, -days_from_week_start(date.weekday(), week_start))
}

/// The 7-day inclusive span (start .. start+6) of the week containing `date`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use time_intent::calendar::{week_span, WeekStart};
///
/// let wed = NaiveDate::from_ymd_opt(2025, 6, 18).unwrap();
/// let (start, end) = week_span(wed, WeekStart::Monday).unwrap();
/// assert_eq!(start, NaiveDate::from_ymd_opt(2025, 6, 16).unwrap());
/// assert_eq!(end, NaiveDate::from_ymd_opt(2025, 6, 22).unwrap());
/// ```
pub fn week_span(date: NaiveDate, week_start: WeekStart) -> Option<(NaiveDate, NaiveDate)> {
    let start = start_of_week(date, week_start)?;
    let end = shift_days(start, 6)?;
    Some((start, end))
}

/// Inclusive number of calendar days from `start` to `end`.
///
/// Reversed arguments count the same span.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days().abs() + 1
}

// ── Month arithmetic ────────────────────────────────────────────────────────

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// First day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

/// Last day of the given month.
pub fn last_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (ny, nm) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(ny, nm, 1)?.pred_opt()
}

/// Shift a date by whole months, clamping the day to the target month's length.
pub fn add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    }
}

/// Every calendar month touched by the span between two dates.
///
/// Steps from the first-of-month of the earlier date to the first-of-month of
/// the later one by whole months. The result is ascending and duplicate-free;
/// a span of a year or more yields all twelve months.
pub fn months_touched(a: NaiveDate, b: NaiveDate) -> Vec<u32> {
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    let (Some(mut cursor), Some(last)) = (first_of_month(a), first_of_month(b)) else {
        return Vec::new();
    };

    let mut seen = [false; 12];
    for _ in 0..12 {
        if cursor > last {
            break;
        }
        seen[cursor.month0() as usize] = true;
        match cursor.checked_add_months(Months::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }

    (1..=12u32).filter(|m| seen[(*m - 1) as usize]).collect()
}

/// The inclusive run of months from `first` to `last` on a ring of twelve.
///
/// `month_cycle(10, 2)` wraps past December: `[10, 11, 12, 1, 2]`.
/// Out-of-range month numbers yield an empty run.
pub fn month_cycle(first: u32, last: u32) -> Vec<u32> {
    if !(1..=12).contains(&first) || !(1..=12).contains(&last) {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(12);
    let mut m = first;
    loop {
        out.push(m);
        if m == last {
            break;
        }
        m = m % 12 + 1;
    }
    out
}

/// The three months of quarter `q` (1-4).
pub fn quarter_months(q: u32) -> Option<[u32; 3]> {
    match q {
        1..=4 => {
            let first = (q - 1) * 3 + 1;
            Some([first, first + 1, first + 2])
        }
        _ => None,
    }
}

/// The quarter (1-4) a month (1-12) belongs to.
pub fn quarter_of(month: u32) -> u32 {
    (month.clamp(1, 12) - 1) / 3 + 1
}

/// Three-letter display name for a month number (1-12).
pub fn month_abbrev(month: u32) -> Option<&'static str> {
    MONTH_ABBREVS.get(month.checked_sub(1)? as usize).copied()
}

/// Parse a lowercase month token to its number (1-12).
///
/// Accepts full names and any prefix of a full name of at least three
/// letters: `"jun"`, `"june"`, `"sept"`, `"septem"`. Longer words that merely
/// start with a month abbreviation (`"marathon"`, `"mayhem"`) are rejected.
pub fn parse_month(token: &str) -> Option<u32> {
    if token.len() < 3 || !token.bytes().all(|b| b.is_ascii_lowercase()) {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|name| name.starts_with(token))
        .map(|i| i as u32 + 1)
}

/// Parse a lowercase weekday name, full or abbreviated.
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Short human-readable date, e.g. "Jun 15, 2025".
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_from_str() {
        assert_eq!("Monday".parse::<WeekStart>().unwrap(), WeekStart::Monday);
        assert_eq!(" sun ".parse::<WeekStart>().unwrap(), WeekStart::Sunday);
        let err = "friday".parse::<WeekStart>().unwrap_err().to_string();
        assert!(err.contains("Invalid week start"), "got: {err}");
    }

    #[test]
    fn test_start_of_week_monday() {
        // Wednesday, June 18 2025
        assert_eq!(
            start_of_week(date(2025, 6, 18), WeekStart::Monday),
            Some(date(2025, 6, 16))
        );
        // A Monday is its own week start
        assert_eq!(
            start_of_week(date(2025, 6, 16), WeekStart::Monday),
            Some(date(2025, 6, 16))
        );
        // A Sunday belongs to the week that started six days earlier
        assert_eq!(
            start_of_week(date(2025, 6, 22), WeekStart::Monday),
            Some(date(2025, 6, 16))
        );
    }

    #[test]
    fn test_start_of_week_sunday() {
        assert_eq!(
            start_of_week(date(2025, 6, 18), WeekStart::Sunday),
            Some(date(2025, 6, 15))
        );
        assert_eq!(
            start_of_week(date(2025, 6, 15), WeekStart::Sunday),
            Some(date(2025, 6, 15))
        );
    }

    #[test]
    fn test_week_span_crosses_year() {
        // Wednesday, Jan 1 2025
        let (start, end) = week_span(date(2025, 1, 1), WeekStart::Monday).unwrap();
        assert_eq!(start, date(2024, 12, 30));
        assert_eq!(end, date(2025, 1, 5));
    }

    #[test]
    fn test_week_span_at_calendar_edge() {
        // Must not panic at either end of the representable calendar
        let _ = week_span(NaiveDate::MIN, WeekStart::Monday);
        let _ = week_span(NaiveDate::MAX, WeekStart::Sunday);
        assert_eq!(shift_days(NaiveDate::MAX, 1), None);
    }

    #[test]
    fn test_inclusive_days() {
        assert_eq!(inclusive_days(date(2025, 5, 12), date(2025, 5, 12)), 1);
        assert_eq!(inclusive_days(date(2025, 5, 12), date(2025, 5, 18)), 7);
        assert_eq!(inclusive_days(date(2025, 5, 18), date(2025, 5, 12)), 7);
    }

    #[test]
    fn test_last_of_month() {
        assert_eq!(last_of_month(2024, 2), Some(date(2024, 2, 29)));
        assert_eq!(last_of_month(2025, 2), Some(date(2025, 2, 28)));
        assert_eq!(last_of_month(2025, 12), Some(date(2025, 12, 31)));
        assert_eq!(last_of_month(2025, 13), None);
    }

    #[test]
    fn test_add_months_clamps_day() {
        assert_eq!(add_months(date(2025, 1, 31), 1), Some(date(2025, 2, 28)));
        assert_eq!(add_months(date(2025, 3, 15), -3), Some(date(2024, 12, 15)));
    }

    #[test]
    fn test_months_touched_single_month() {
        assert_eq!(months_touched(date(2025, 6, 1), date(2025, 6, 30)), vec![6]);
    }

    #[test]
    fn test_months_touched_crosses_year() {
        assert_eq!(
            months_touched(date(2025, 11, 20), date(2026, 2, 3)),
            vec![1, 2, 11, 12]
        );
    }

    #[test]
    fn test_months_touched_reversed_arguments() {
        assert_eq!(
            months_touched(date(2025, 7, 2), date(2025, 5, 30)),
            vec![5, 6, 7]
        );
    }

    #[test]
    fn test_months_touched_steps_by_month_not_days() {
        // Jan 31 → Mar 1 touches February even though no 30-day step lands in it
        assert_eq!(
            months_touched(date(2025, 1, 31), date(2025, 3, 1)),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_months_touched_long_span_is_all_months() {
        assert_eq!(
            months_touched(date(2000, 3, 1), date(2030, 3, 1)),
            (1..=12).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_month_cycle() {
        assert_eq!(month_cycle(6, 9), vec![6, 7, 8, 9]);
        assert_eq!(month_cycle(10, 2), vec![10, 11, 12, 1, 2]);
        assert_eq!(month_cycle(4, 4), vec![4]);
        assert!(month_cycle(0, 4).is_empty());
        assert!(month_cycle(4, 13).is_empty());
    }

    #[test]
    fn test_quarters() {
        assert_eq!(quarter_months(1), Some([1, 2, 3]));
        assert_eq!(quarter_months(3), Some([7, 8, 9]));
        assert_eq!(quarter_months(5), None);
        assert_eq!(quarter_of(1), 1);
        assert_eq!(quarter_of(9), 3);
        assert_eq!(quarter_of(12), 4);
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("jun"), Some(6));
        assert_eq!(parse_month("june"), Some(6));
        assert_eq!(parse_month("sept"), Some(9));
        assert_eq!(parse_month("september"), Some(9));
        assert_eq!(parse_month("may"), Some(5));
        assert_eq!(parse_month("ju"), None);
        assert_eq!(parse_month("marathon"), None);
        assert_eq!(parse_month("mayhem"), None);
        assert_eq!(parse_month("June"), None);
    }

    #[test]
    fn test_month_abbrev() {
        assert_eq!(month_abbrev(1), Some("Jan"));
        assert_eq!(month_abbrev(12), Some("Dec"));
        assert_eq!(month_abbrev(0), None);
        assert_eq!(month_abbrev(13), None);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(date(2025, 6, 5)), "Jun 5, 2025");
    }
}
