//! Natural-language time-intent parsing.
//!
//! [`IntentParser::parse`] turns free text plus a caller-supplied "now" into a
//! [`TimeIntent`], or `None` when nothing in the text is understood. No
//! system clock is read here; the caller provides the anchor, keeping every
//! parse deterministic.
//!
//! # Strategy chain
//!
//! Four independent recognizers are tried in a fixed order and the first
//! match wins:
//!
//! 1. **Relative phrases**: `today`, `tomorrow`, `this/next/last week`,
//!    `next 2 weeks`, `last 3 weeks`, `this/next month`,
//!    `this/next quarter`, `this weekend`
//! 2. **Month ranges and quarters**: `Q3`, `jun-sep`, `June–July`, `oct to feb`
//! 3. **General dates** via a [`DateRecognizer`]: `week of May 12`,
//!    `2025-09-27`, `May 12-20`, `from June 3 to June 9`
//! 4. **Bare month names**: `June`, `may or june`, `sept`
//!
//! A fragment that looks right but names an impossible date makes its
//! strategy decline, and the chain moves on.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::calendar::{
    add_months, first_of_month, format_date, inclusive_days, last_of_month, month_abbrev,
    parse_month, quarter_months, quarter_of, shift_days, start_of_week, week_span,
    WeekStart,
};
use crate::error::{IntentError, Result};
use crate::intent::{month_set_label, TimeIntent};
use crate::recognizer::{BuiltinRecognizer, DateRecognizer, RecognizeOptions};

/// Longest input, in characters, the parser will look at.
pub const MAX_INPUT_CHARS: usize = 512;

// ── Options ─────────────────────────────────────────────────────────────────

/// Options for [`IntentParser`] and [`parse_intent_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Which day starts a week window.
    pub week_start: WeekStart,
    /// Timezone used to turn the "now" instant into a calendar date.
    pub timezone: Tz,
    /// Resolve year-less dates forward (next occurrence) instead of to the
    /// nearest occurrence. "week of ..." phrasing is always resolved forward.
    pub forward_dates: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            week_start: WeekStart::Monday,
            timezone: Tz::UTC,
            forward_dates: false,
        }
    }
}

impl ParseOptions {
    /// Set the timezone from an IANA name (e.g. `"America/Toronto"`).
    ///
    /// # Errors
    ///
    /// Returns [`IntentError::InvalidTimezone`] if the name is not a valid IANA timezone.
    pub fn with_timezone_name(mut self, name: &str) -> Result<Self> {
        self.timezone = parse_timezone(name)?;
        Ok(self)
    }
}

/// Parse an IANA timezone string into `Tz`.
pub fn parse_timezone(s: &str) -> Result<Tz> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| IntentError::InvalidTimezone(format!("'{}'", s.trim())))
}

/// Parse a reference instant: RFC 3339, or a bare `YYYY-MM-DD` taken as
/// midnight UTC.
///
/// # Errors
///
/// Returns [`IntentError::InvalidDatetime`] if the string is neither form.
pub fn parse_reference(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(|e| IntentError::InvalidDatetime(format!("'{}': {}", s, e)))
}

// ── Parser ──────────────────────────────────────────────────────────────────

/// A time-intent parser with fixed options and a date recognizer.
///
/// Parsing takes `&self` and touches no shared state, so one parser can be
/// shared freely across threads.
#[derive(Debug, Clone, Default)]
pub struct IntentParser<R = BuiltinRecognizer> {
    options: ParseOptions,
    recognizer: R,
}

impl IntentParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: DateRecognizer> IntentParser<R> {
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Swap the general date recognizer used by the third strategy.
    pub fn with_recognizer<R2: DateRecognizer>(self, recognizer: R2) -> IntentParser<R2> {
        IntentParser {
            options: self.options,
            recognizer,
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse `text` relative to `now`.
    ///
    /// Returns `None` when no strategy understands the text, including empty,
    /// whitespace-only, and over-long input.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use time_intent::{IntentParser, WindowKind};
    ///
    /// let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
    /// let intent = IntentParser::new().parse("Jun–Sep", now).unwrap();
    /// assert_eq!(intent.window(), WindowKind::Month);
    /// assert_eq!(intent.months(), &[6, 7, 8, 9]);
    /// assert_eq!(intent.label(), "Jun–Sep");
    /// ```
    pub fn parse(&self, text: &str, now: DateTime<Utc>) -> Option<TimeIntent> {
        let normalized = normalize_text(text)?;
        let today = now.with_timezone(&self.options.timezone).date_naive();
        let cx = Context {
            text: &normalized,
            today,
            options: &self.options,
            recognizer: &self.recognizer,
        };

        for (name, strategy) in STRATEGIES {
            if let Some(intent) = strategy(&cx) {
                tracing::debug!(
                    strategy = name,
                    window = %intent.window(),
                    label = intent.label(),
                    "time intent recognized"
                );
                return Some(intent);
            }
        }
        tracing::debug!(text = %normalized, "time intent not understood");
        None
    }
}

/// Parse with default options (Monday weeks, UTC, nearest-date inference).
pub fn parse_intent(text: &str, now: DateTime<Utc>) -> Option<TimeIntent> {
    IntentParser::new().parse(text, now)
}

/// Parse with explicit options.
pub fn parse_intent_with_options(
    text: &str,
    now: DateTime<Utc>,
    options: &ParseOptions,
) -> Option<TimeIntent> {
    IntentParser::new().with_options(*options).parse(text, now)
}

/// Parse, reporting "not understood" as an error for `?`-style callers.
///
/// # Errors
///
/// Returns [`IntentError::NotUnderstood`] when no strategy matches.
pub fn resolve_intent(
    text: &str,
    now: DateTime<Utc>,
    options: &ParseOptions,
) -> Result<TimeIntent> {
    parse_intent_with_options(text, now, options)
        .ok_or_else(|| IntentError::NotUnderstood(text.trim().to_string()))
}

/// Trim, lowercase, and collapse whitespace. `None` for empty or over-long input.
fn normalize_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_INPUT_CHARS {
        return None;
    }
    Some(
        trimmed
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
    )
}

// ── Strategy chain ──────────────────────────────────────────────────────────

struct Context<'a> {
    text: &'a str,
    today: NaiveDate,
    options: &'a ParseOptions,
    recognizer: &'a dyn DateRecognizer,
}

type Strategy = fn(&Context<'_>) -> Option<TimeIntent>;

const STRATEGIES: [(&str, Strategy); 4] = [
    ("relative", try_relative),
    ("month_range", try_month_range),
    ("recognized", try_recognized),
    ("month_names", try_month_names),
];

struct Patterns {
    this_week: Regex,
    next_week: Regex,
    last_week: Regex,
    today: Regex,
    tomorrow: Regex,
    next_count: Regex,
    last_weeks: Regex,
    this_month: Regex,
    next_month: Regex,
    this_quarter: Regex,
    next_quarter: Regex,
    this_weekend: Regex,
    quarter: Regex,
    range_separator: Regex,
    week_of: Regex,
    word: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(Patterns::new)
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in intent pattern is valid")
}

impl Patterns {
    fn new() -> Self {
        Self {
            this_week: compile(r"\b(?:this|current)\s+week\b"),
            next_week: compile(r"\bnext\s+week\b"),
            last_week: compile(r"\b(?:last|previous)\s+week\b"),
            today: compile(r"\btoday\b"),
            tomorrow: compile(r"\btomorrow\b"),
            next_count: compile(r"\bnext\s+(\d{1,2})\s+(weeks?|months?)\b"),
            last_weeks: compile(r"\b(?:last|past|previous)\s+(\d{1,2})\s+weeks?\b"),
            this_month: compile(r"\b(?:this|current)\s+month\b"),
            next_month: compile(r"\bnext\s+month\b"),
            this_quarter: compile(r"\b(?:this|current)\s+quarter\b"),
            next_quarter: compile(r"\bnext\s+quarter\b"),
            this_weekend: compile(r"\bthis\s+weekend\b"),
            quarter: compile(r"\bq([1-4])\b"),
            range_separator: compile(r"^(?:\s*[-–—]\s*|\s+(?:to|through|thru|till|until)\s+)$"),
            week_of: compile(r"\bweek\s+of\s+(.+)$"),
            word: compile(r"[a-z]+"),
        }
    }
}

// ── 1. Relative phrases ─────────────────────────────────────────────────────

fn try_relative(cx: &Context<'_>) -> Option<TimeIntent> {
    relative_week(cx)
        .or_else(|| relative_day(cx))
        .or_else(|| relative_count(cx))
        .or_else(|| relative_month(cx))
        .or_else(|| relative_quarter(cx))
        .or_else(|| this_weekend(cx))
}

/// The week containing `today` shifted by `weeks`, labelled `label`.
fn week_relative(cx: &Context<'_>, weeks: i64, label: &str) -> Option<TimeIntent> {
    let this_start = start_of_week(cx.today, cx.options.week_start)?;
    TimeIntent::week(shift_days(this_start, weeks * 7)?, label)
}

fn relative_week(cx: &Context<'_>) -> Option<TimeIntent> {
    let p = patterns();
    if p.this_week.is_match(cx.text) {
        week_relative(cx, 0, "This week")
    } else if p.next_week.is_match(cx.text) {
        week_relative(cx, 1, "Next week")
    } else if p.last_week.is_match(cx.text) {
        week_relative(cx, -1, "Last week")
    } else {
        None
    }
}

fn relative_day(cx: &Context<'_>) -> Option<TimeIntent> {
    let p = patterns();
    if p.today.is_match(cx.text) {
        TimeIntent::day(cx.today, "Today")
    } else if p.tomorrow.is_match(cx.text) {
        TimeIntent::day(shift_days(cx.today, 1)?, "Tomorrow")
    } else {
        None
    }
}

/// "next N weeks/months" and "last N weeks".
fn relative_count(cx: &Context<'_>) -> Option<TimeIntent> {
    let p = patterns();

    if let Some(caps) = p.next_count.captures(cx.text) {
        let n: i64 = caps.get(1)?.as_str().parse().ok()?;
        if n == 0 {
            return None;
        }
        let unit = caps.get(2)?.as_str();
        if unit.starts_with("week") {
            if n == 1 {
                return week_relative(cx, 1, "Next week");
            }
            let end = shift_days(cx.today, n * 7)?;
            return TimeIntent::month_span(cx.today, end, format!("Next {n} weeks"));
        }
        // Months count as 30 days
        let end = shift_days(cx.today, n * 30)?;
        let label = format!("Next {n} month{}", if n == 1 { "" } else { "s" });
        return TimeIntent::month_span(cx.today, end, label);
    }

    if let Some(caps) = p.last_weeks.captures(cx.text) {
        let n: i64 = caps.get(1)?.as_str().parse().ok()?;
        if n == 0 {
            return None;
        }
        if n == 1 {
            return week_relative(cx, -1, "Last week");
        }
        let this_start = start_of_week(cx.today, cx.options.week_start)?;
        let start = shift_days(this_start, -n * 7)?;
        let end = shift_days(this_start, -1)?;
        return TimeIntent::month_span(start, end, format!("Last {n} weeks"));
    }

    None
}

fn relative_month(cx: &Context<'_>) -> Option<TimeIntent> {
    let p = patterns();
    let (offset, label) = if p.this_month.is_match(cx.text) {
        (0, "This month")
    } else if p.next_month.is_match(cx.text) {
        (1, "Next month")
    } else {
        return None;
    };
    let first = add_months(first_of_month(cx.today)?, offset)?;
    let last = last_of_month(first.year(), first.month())?;
    TimeIntent::month_span(first, last, label)
}

fn relative_quarter(cx: &Context<'_>) -> Option<TimeIntent> {
    let p = patterns();
    let (offset, prefix) = if p.this_quarter.is_match(cx.text) {
        (0, "This quarter")
    } else if p.next_quarter.is_match(cx.text) {
        (3, "Next quarter")
    } else {
        return None;
    };
    let q = quarter_of(cx.today.month());
    let this_first = NaiveDate::from_ymd_opt(cx.today.year(), (q - 1) * 3 + 1, 1)?;
    let first = add_months(this_first, offset)?;
    let last = last_of_month(first.year(), first.month() + 2)?;
    let label = format!("{prefix} (Q{})", quarter_of(first.month()));
    TimeIntent::month_span(first, last, label)
}

/// The week holding the coming (or current) Saturday.
///
/// Monday weeks hold the whole weekend. Sunday weeks end on that Saturday,
/// so the weekend's Sunday opens the following week and is left out.
fn this_weekend(cx: &Context<'_>) -> Option<TimeIntent> {
    if !patterns().this_weekend.is_match(cx.text) {
        return None;
    }
    let from_monday = cx.today.weekday().num_days_from_monday() as i64;
    // On a Sunday the weekend is already under way
    let saturday = if from_monday == 6 {
        shift_days(cx.today, -1)?
    } else {
        shift_days(cx.today, 5 - from_monday)?
    };
    let (start, _) = week_span(saturday, cx.options.week_start)?;
    TimeIntent::week(start, "This weekend")
}

// ── 2. Month ranges and quarters ────────────────────────────────────────────

fn try_month_range(cx: &Context<'_>) -> Option<TimeIntent> {
    let p = patterns();

    if let Some(caps) = p.quarter.captures(cx.text) {
        let q: u32 = caps.get(1)?.as_str().parse().ok()?;
        return TimeIntent::month_set(quarter_months(q)?, format!("Q{q}"));
    }

    // Only month words take part, so "mid-jun-aug" still pairs jun with aug
    let months: Vec<(regex::Match<'_>, u32)> = p
        .word
        .find_iter(cx.text)
        .filter_map(|m| Some((m, parse_month(m.as_str())?)))
        .collect();
    months.windows(2).find_map(|pair| {
        let [(a, first), (b, last)] = pair else {
            return None;
        };
        if !p.range_separator.is_match(&cx.text[a.end()..b.start()]) {
            return None;
        }
        let label = if first == last {
            month_abbrev(*first)?.to_string()
        } else {
            format!("{}–{}", month_abbrev(*first)?, month_abbrev(*last)?)
        };
        TimeIntent::month_run(*first, *last, label)
    })
}

// ── 3. General date recognition ─────────────────────────────────────────────

fn try_recognized(cx: &Context<'_>) -> Option<TimeIntent> {
    if let Some(intent) = week_of(cx) {
        return Some(intent);
    }

    let options = RecognizeOptions {
        forward_date_bias: cx.options.forward_dates,
    };
    let first = cx
        .recognizer
        .recognize(cx.text, cx.today, options)
        .into_iter()
        .next()?;

    match first.end {
        None => TimeIntent::day(first.start, format_date(first.start)),
        Some(end) => classify_span(cx, first.start, end),
    }
}

/// "week of <date>": anchor a week window on the forward-resolved date.
fn week_of(cx: &Context<'_>) -> Option<TimeIntent> {
    let caps = patterns().week_of.captures(cx.text)?;
    let fragment = caps.get(1)?.as_str();
    let options = RecognizeOptions {
        forward_date_bias: true,
    };
    let anchor = cx
        .recognizer
        .recognize(fragment, cx.today, options)
        .into_iter()
        .next()?
        .start;
    let (start, _) = week_span(anchor, cx.options.week_start)?;
    TimeIntent::week(start, format!("Week of {}", format_date(anchor)))
}

/// Classify an explicit span by its inclusive length.
///
/// One day is a day window; 6–9 days snap to the calendar week holding the
/// span's midpoint; anything else becomes the set of months it touches.
fn classify_span(cx: &Context<'_>, start: NaiveDate, end: NaiveDate) -> Option<TimeIntent> {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    match inclusive_days(start, end) {
        ..=1 => TimeIntent::day(start, format_date(start)),
        days @ 6..=9 => {
            let midpoint = shift_days(start, (days - 1) / 2)?;
            let (week_start, _) = week_span(midpoint, cx.options.week_start)?;
            TimeIntent::week(week_start, format!("Week of {}", format_date(week_start)))
        }
        _ => TimeIntent::month_span(
            start,
            end,
            format!("{} – {}", format_date(start), format_date(end)),
        ),
    }
}

// ── 4. Bare month names ─────────────────────────────────────────────────────

fn try_month_names(cx: &Context<'_>) -> Option<TimeIntent> {
    let mut months: Vec<u32> = patterns()
        .word
        .find_iter(cx.text)
        .filter_map(|m| parse_month(m.as_str()))
        .collect();
    if months.is_empty() {
        return None;
    }
    months.sort_unstable();
    months.dedup();
    let label = month_set_label(&months);
    TimeIntent::month_set(months, label)
}
