//! The parser's output: a normalized, typed time window.
//!
//! A [`TimeIntent`] can only be built through its constructors, each of which
//! enforces the shape rules for its window kind:
//!
//! - `months` is never empty, duplicate-free, and 1-based. It ascends around
//!   the month ring from its first entry: a named month range keeps its start
//!   month first (Oct–Feb is `[10, 11, 12, 1, 2]`), every other window starts
//!   at its lowest month.
//! - `day` and `week` windows always carry `start` and `end`.
//! - a `week` spans exactly seven calendar days (`end = start + 6`).
//! - a `day` has `start == end`.
//! - the label is never empty.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::calendar::{self, month_abbrev, months_touched};

/// Granularity of a recognized time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// A single calendar day.
    Day,
    /// Seven consecutive days starting on the configured week start.
    Week,
    /// A set of calendar months, contiguous or not.
    Month,
}

impl WindowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WindowKind::Day => "day",
            WindowKind::Week => "week",
            WindowKind::Month => "month",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized time window extracted from free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeIntent {
    window: WindowKind,
    months: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<NaiveDate>,
    label: String,
}

impl TimeIntent {
    /// A single-day window.
    pub fn day(date: NaiveDate, label: impl Into<String>) -> Option<Self> {
        Self::build(
            WindowKind::Day,
            vec![date.month()],
            Some((date, date)),
            label.into(),
        )
    }

    /// A seven-day window starting at `start`.
    ///
    /// The caller is responsible for `start` falling on the configured week
    /// start; see [`calendar::week_span`].
    pub fn week(start: NaiveDate, label: impl Into<String>) -> Option<Self> {
        let end = calendar::shift_days(start, 6)?;
        Self::build(
            WindowKind::Week,
            months_touched(start, end),
            Some((start, end)),
            label.into(),
        )
    }

    /// A month-set window without explicit bounds.
    ///
    /// Returns `None` when `months` is empty or holds a value outside 1..=12.
    pub fn month_set(
        months: impl IntoIterator<Item = u32>,
        label: impl Into<String>,
    ) -> Option<Self> {
        let mut months: Vec<u32> = months.into_iter().collect();
        if months.iter().any(|m| !(1..=12).contains(m)) {
            return None;
        }
        months.sort_unstable();
        months.dedup();
        Self::build(WindowKind::Month, months, None, label.into())
    }

    /// The inclusive run of months from `first` around the ring to `last`.
    ///
    /// Month order follows the ring, so `month_run(11, 1, ..)` holds
    /// `[11, 12, 1]`.
    pub fn month_run(first: u32, last: u32, label: impl Into<String>) -> Option<Self> {
        Self::build(
            WindowKind::Month,
            calendar::month_cycle(first, last),
            None,
            label.into(),
        )
    }

    /// A month-set window derived from an explicit date span.
    ///
    /// The bounds are kept so callers can build a precise query range;
    /// reversed bounds are reordered.
    pub fn month_span(
        start: NaiveDate,
        end: NaiveDate,
        label: impl Into<String>,
    ) -> Option<Self> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self::build(
            WindowKind::Month,
            months_touched(start, end),
            Some((start, end)),
            label.into(),
        )
    }

    fn build(
        window: WindowKind,
        months: Vec<u32>,
        bounds: Option<(NaiveDate, NaiveDate)>,
        label: String,
    ) -> Option<Self> {
        let label = label.trim().to_string();
        if months.is_empty() || label.is_empty() {
            return None;
        }
        let (start, end) = match bounds {
            Some((s, e)) => (Some(s), Some(e)),
            None => (None, None),
        };
        Some(Self {
            window,
            months,
            start,
            end,
            label,
        })
    }

    pub fn window(&self) -> WindowKind {
        self.window
    }

    /// Months touched by this window, 1 = January, in ring order from the
    /// first entry.
    pub fn months(&self) -> &[u32] {
        &self.months
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Display text for the recognized phrase. Never empty.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Inclusive day count of the explicit span, if any.
    pub fn span_days(&self) -> Option<i64> {
        Some(calendar::inclusive_days(self.start?, self.end?))
    }
}

/// Render a month set for display.
///
/// A single month is its name, two consecutive months are joined with an en
/// dash ("May–Jun", "Dec–Jan"), anything else is a comma list.
pub fn month_set_label(months: &[u32]) -> String {
    let names: Vec<&str> = months.iter().filter_map(|m| month_abbrev(*m)).collect();
    match (months, names.as_slice()) {
        ([a, b], [na, nb]) if *b == *a % 12 + 1 => format!("{na}–{nb}"),
        _ => names.join(", "),
    }
}
