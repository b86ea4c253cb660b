//! Concrete query ranges derived from a [`TimeIntent`].
//!
//! A parsed intent says *what* window the user meant; callers still need
//! explicit instants to slice a daily time series or to export a calendar
//! event. Intents with explicit bounds map directly to those bounds. Bare
//! month sets are laid onto the reference year as one cyclic run, so a set
//! like Oct–Feb spans the year boundary instead of collapsing to Jan–Dec.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use crate::calendar::last_of_month;
use crate::intent::TimeIntent;

/// An inclusive span of instants in a timezone.
///
/// Serializes both bounds as RFC 3339 strings with numeric offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRange {
    #[serde(serialize_with = "rfc3339")]
    pub start: DateTime<Tz>,
    #[serde(serialize_with = "rfc3339")]
    pub end: DateTime<Tz>,
}

impl QueryRange {
    /// Derive the query range for `intent`.
    ///
    /// Explicit bounds run from 00:00:00 on `start` to 23:59:59 on `end`.
    /// Month sets without bounds are placed in the year of `now` (as seen in
    /// `tz`) as one run around the month ring; see [`TimeIntent::months`].
    /// A day that skips local midnight starts at its first valid instant.
    /// Returns `None` only when a bound cannot be represented in `tz`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use chrono_tz::Tz;
    /// use time_intent::{parse_intent, QueryRange};
    ///
    /// let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
    /// let intent = parse_intent("oct-feb", now).unwrap();
    /// let range = QueryRange::from_intent(&intent, now, Tz::UTC).unwrap();
    /// assert_eq!(range.start.to_rfc3339(), "2025-10-01T00:00:00+00:00");
    /// assert_eq!(range.end.to_rfc3339(), "2026-02-28T23:59:59+00:00");
    /// ```
    pub fn from_intent(intent: &TimeIntent, now: DateTime<Utc>, tz: Tz) -> Option<Self> {
        let (first_day, last_day) = match (intent.start(), intent.end()) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                let year = now.with_timezone(&tz).year();
                month_run_bounds(intent.months(), year)?
            }
        };
        Some(Self {
            start: local_at(&tz, first_day, NaiveTime::MIN)?,
            end: local_at(&tz, last_day, NaiveTime::from_hms_opt(23, 59, 59)?)?,
        })
    }

    /// The span to use for a calendar event.
    ///
    /// Events must have a positive length: a range whose end does not exceed
    /// its start is stretched to one hour.
    pub fn calendar_event(&self) -> Self {
        let end = if self.end > self.start {
            self.end
        } else {
            self.start + chrono::Duration::hours(1)
        };
        Self {
            start: self.start,
            end,
        }
    }

    /// Both bounds as compact `YYYYMMDD` dates, the form daily climate APIs take.
    pub fn compact_dates(&self) -> (String, String) {
        (
            self.start.format("%Y%m%d").to_string(),
            self.end.format("%Y%m%d").to_string(),
        )
    }
}

/// The `years` full calendar years ending the year before `now`.
///
/// Climatology is computed over completed years only; `history_years(now, 10)`
/// in 2025 yields `(2015, 2024)`. A zero count is treated as one year.
pub fn history_years(now: DateTime<Utc>, years: u32) -> (i32, i32) {
    let last = now.year() - 1;
    let span = years.max(1) as i32;
    (last - (span - 1), last)
}

/// First and last day of the cyclic month run containing every month in `months`.
fn month_run_bounds(months: &[u32], year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let (first, last) = cyclic_run(months)?;
    let end_year = if last < first { year + 1 } else { year };
    let start = NaiveDate::from_ymd_opt(year, first, 1)?;
    let end = last_of_month(end_year, last)?;
    Some((start, end))
}

/// The run around the month ring covering `months`.
///
/// A set already laid out as a ring run, like `[10, 11, 12, 1, 2]` from a
/// named range, keeps its own start. Anything else is cut at its widest gap,
/// with ties cut at Dec→Jan, so `[3, 7, 9]` runs Mar..Sep.
fn cyclic_run(months: &[u32]) -> Option<(u32, u32)> {
    let (&first, &last) = (months.first()?, months.last()?);
    if months.windows(2).all(|w| w[1] == w[0] % 12 + 1) {
        return Some((first, last));
    }
    let mut sorted = months.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    let widest = (0..n).max_by_key(|&i| ((sorted[(i + 1) % n] + 12 - sorted[i]) % 12, i))?;
    Some((sorted[(widest + 1) % n], sorted[widest]))
}

fn rfc3339<S: Serializer>(dt: &DateTime<Tz>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&dt.to_rfc3339())
}

/// `date` at `time` in `tz`, or the first valid instant after a DST gap.
fn local_at(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
    let local = date.and_time(time);
    if let Some(dt) = tz.from_local_datetime(&local).earliest() {
        return Some(dt);
    }
    // Gaps last at most a few hours; step forward by minutes until one resolves
    let resolved = (1..=24 * 60).find_map(|minutes| {
        let shifted = local.checked_add_signed(chrono::Duration::minutes(minutes))?;
        tz.from_local_datetime(&shifted).earliest()
    });
    match resolved {
        Some(dt) => tracing::debug!(%local, resolved = %dt, timezone = %tz, "local time skipped"),
        None => tracing::warn!(%local, timezone = %tz, "local time has no instant"),
    }
    resolved
}
