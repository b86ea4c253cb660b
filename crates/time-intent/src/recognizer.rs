//! General date and date-range recognition.
//!
//! The parser's third strategy delegates to a [`DateRecognizer`]: anything
//! that can find absolute or loosely phrased dates inside free text and
//! report them as `{start, end?, matched_text}`. [`BuiltinRecognizer`] is a
//! deterministic, regex-based implementation that covers the phrasings people
//! type into a date search box:
//!
//! - ISO dates: `2025-09-27`, `2025/09/27`
//! - Month-name dates: `May 12`, `May 12th, 2025`, `12 May 2025`, `12th of May`
//! - US numeric dates: `5/12`, `5/12/2025`, `5/12/25`
//! - Weekdays: `friday`, `next friday`, `this friday`, `last friday`
//! - Anchors and offsets: `yesterday`, `in 3 days`, `2 weeks ago`, `a month from now`
//! - Ranges: `May 12-20`, `May 12 - May 20`, `June 3 to June 9`,
//!   `between 2025-06-01 and 2025-06-10`
//!
//! Fragments that look like a date but name an impossible one (`2025-13-45`,
//! `Feb 30`) are dropped; they never surface as errors.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, Weekday};
use regex::{Captures, Regex};

use crate::calendar::{add_months, parse_month, parse_weekday, shift_days};

/// Options passed to a [`DateRecognizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecognizeOptions {
    /// Resolve year-less dates to their next occurrence on or after the
    /// reference date instead of the nearest one.
    pub forward_date_bias: bool,
}

/// One date or date range found in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognized {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    /// The (lowercased) slice of input that produced this result.
    pub matched_text: String,
}

/// Finds dates and date ranges in free text.
///
/// Implementations must be pure: the same text, reference date, and options
/// always produce the same results, ordered by position in the text.
pub trait DateRecognizer {
    fn recognize(&self, text: &str, reference: NaiveDate, options: RecognizeOptions)
        -> Vec<Recognized>;
}

/// The default regex-based recognizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinRecognizer;

impl DateRecognizer for BuiltinRecognizer {
    fn recognize(
        &self,
        text: &str,
        reference: NaiveDate,
        options: RecognizeOptions,
    ) -> Vec<Recognized> {
        let text = text.to_lowercase();
        let fragments = select_fragments(collect_fragments(&text, reference, options));
        let forward = options.forward_date_bias;

        let mut out = Vec::new();
        let mut i = 0;
        while i < fragments.len() {
            let first = fragments[i];
            if let Some(second) = fragments.get(i + 1) {
                let gap = &text[first.end..second.start];
                let before = &text[..first.start];
                if is_range_connector(gap, before) {
                    if let Some((start, end)) =
                        resolve_range(first.piece, second.piece, reference, forward)
                    {
                        out.push(Recognized {
                            start,
                            end: Some(end),
                            matched_text: text[first.start..second.end].to_string(),
                        });
                        i += 2;
                        continue;
                    }
                }
            }
            if let Some((start, end)) = resolve_single(first.piece, reference, forward) {
                out.push(Recognized {
                    start,
                    end,
                    matched_text: text[first.start..first.end].to_string(),
                });
            }
            i += 1;
        }

        for r in &out {
            tracing::trace!(
                matched = %r.matched_text,
                start = %r.start,
                end = ?r.end,
                "recognized date"
            );
        }
        out
    }
}

// ── Patterns ────────────────────────────────────────────────────────────────

const MONTH_ALT: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";
const WEEKDAY_ALT: &str = "monday|mon|tuesday|tues|tue|wednesday|wed|thursday|thurs|thu|friday|fri|saturday|sat|sunday|sun";
const ORDINAL: &str = "(?:st|nd|rd|th)?";
const COUNT: &str = r"(\d{1,3}|a|an|one)\s+(days?|weeks?|months?)";

struct Patterns {
    iso: Regex,
    numeric: Regex,
    month_day: Regex,
    day_month: Regex,
    day_range: Regex,
    weekday: Regex,
    offset_in: Regex,
    offset_ago: Regex,
    offset_from_now: Regex,
    anchored: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(Patterns::new)
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in date pattern is valid")
}

impl Patterns {
    fn new() -> Self {
        Self {
            // 2025-09-27, 2025/9/27
            iso: compile(r"\b(\d{4})[-/](\d{1,2})[-/](\d{1,2})\b"),
            // 9/27, 9/27/2025, 9/27/25
            numeric: compile(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b"),
            // may 12, sept. 3rd, 2025
            month_day: compile(&format!(
                r"\b({MONTH_ALT})\.?\s+(\d{{1,2}}){ORDINAL}\b(?:,?\s*(\d{{4}})\b)?"
            )),
            // 12 may, 3rd of sept 2025
            day_month: compile(&format!(
                r"\b(\d{{1,2}}){ORDINAL}\s+(?:of\s+)?({MONTH_ALT})\b\.?(?:,?\s*(\d{{4}})\b)?"
            )),
            // may 12-20, june 3rd to 9th, 2025
            day_range: compile(&format!(
                r"\b({MONTH_ALT})\.?\s+(\d{{1,2}}){ORDINAL}\s*(?:-|–|—|to|through|thru|until|till)\s*(\d{{1,2}}){ORDINAL}\b(?:,?\s*(\d{{4}})\b)?"
            )),
            // next friday, this sat, monday
            weekday: compile(&format!(
                r"\b(?:(next|this|last|coming)\s+)?({WEEKDAY_ALT})\b"
            )),
            offset_in: compile(&format!(r"\bin\s+{COUNT}\b")),
            offset_ago: compile(&format!(r"\b{COUNT}\s+ago\b")),
            offset_from_now: compile(&format!(r"\b{COUNT}\s+from\s+(?:now|today)\b")),
            anchored: compile(r"\b(yesterday|today|tomorrow)\b"),
        }
    }
}

// ── Fragments ───────────────────────────────────────────────────────────────

/// What a matched fragment denotes before year inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    Date(NaiveDate),
    /// A date resolved from a weekday name; as a range end it may roll forward.
    Weekday(NaiveDate),
    YearLess {
        month: u32,
        day: u32,
    },
    DayRange {
        month: u32,
        from: u32,
        to: u32,
        year: Option<i32>,
    },
}

#[derive(Debug, Clone, Copy)]
struct Fragment {
    start: usize,
    end: usize,
    piece: Piece,
}

fn collect_fragments(text: &str, reference: NaiveDate, options: RecognizeOptions) -> Vec<Fragment> {
    let p = patterns();
    let forward = options.forward_date_bias;
    let mut out = Vec::new();

    scan(&p.iso, text, &mut out, |c| {
        let date = NaiveDate::from_ymd_opt(num(c, 1)?, num(c, 2)?, num(c, 3)?)?;
        Some(Piece::Date(date))
    });
    scan(&p.numeric, text, &mut out, |c| {
        let (month, day) = (num(c, 1)?, num(c, 2)?);
        match c.get(3) {
            Some(y) => {
                let year: i32 = y.as_str().parse().ok()?;
                let year = if y.as_str().len() == 2 { 2000 + year } else { year };
                Some(Piece::Date(NaiveDate::from_ymd_opt(year, month, day)?))
            }
            None => year_less(month, day),
        }
    });
    scan(&p.month_day, text, &mut out, |c| {
        month_and_day(parse_month(c.get(1)?.as_str())?, num(c, 2)?, c.get(3))
    });
    scan(&p.day_month, text, &mut out, |c| {
        month_and_day(parse_month(c.get(2)?.as_str())?, num(c, 1)?, c.get(3))
    });
    scan(&p.day_range, text, &mut out, |c| {
        let month = parse_month(c.get(1)?.as_str())?;
        let year = match c.get(4) {
            Some(y) => Some(y.as_str().parse().ok()?),
            None => None,
        };
        Some(Piece::DayRange {
            month,
            from: num(c, 2)?,
            to: num(c, 3)?,
            year,
        })
    });
    scan(&p.weekday, text, &mut out, |c| {
        let weekday = parse_weekday(c.get(2)?.as_str())?;
        let modifier = c.get(1).map(|m| m.as_str());
        Some(Piece::Weekday(resolve_weekday(reference, weekday, modifier, forward)?))
    });
    scan(&p.offset_in, text, &mut out, |c| {
        Some(Piece::Date(offset(reference, c, 1)?))
    });
    scan(&p.offset_from_now, text, &mut out, |c| {
        Some(Piece::Date(offset(reference, c, 1)?))
    });
    scan(&p.offset_ago, text, &mut out, |c| {
        Some(Piece::Date(offset(reference, c, -1)?))
    });
    scan(&p.anchored, text, &mut out, |c| {
        let days = match c.get(1)?.as_str() {
            "yesterday" => -1,
            "tomorrow" => 1,
            _ => 0,
        };
        Some(Piece::Date(shift_days(reference, days)?))
    });

    out
}

fn scan<F>(re: &Regex, text: &str, out: &mut Vec<Fragment>, mut to_piece: F)
where
    F: FnMut(&Captures<'_>) -> Option<Piece>,
{
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if let Some(piece) = to_piece(&caps) {
            out.push(Fragment {
                start: whole.start(),
                end: whole.end(),
                piece,
            });
        }
    }
}

/// Keep the earliest, then longest, of any overlapping fragments.
fn select_fragments(mut fragments: Vec<Fragment>) -> Vec<Fragment> {
    fragments.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    let mut kept: Vec<Fragment> = Vec::with_capacity(fragments.len());
    for f in fragments {
        if kept.last().is_none_or(|last| f.start >= last.end) {
            kept.push(f);
        }
    }
    kept
}

fn is_range_connector(gap: &str, before: &str) -> bool {
    match gap.trim() {
        "-" | "–" | "—" | "to" | "through" | "thru" | "until" | "till" => true,
        "and" => before.trim_end().ends_with("between"),
        _ => false,
    }
}

fn num<T: std::str::FromStr>(caps: &Captures<'_>, group: usize) -> Option<T> {
    caps.get(group)?.as_str().parse().ok()
}

fn month_and_day(month: u32, day: u32, year: Option<regex::Match<'_>>) -> Option<Piece> {
    match year {
        Some(y) => {
            let year: i32 = y.as_str().parse().ok()?;
            Some(Piece::Date(NaiveDate::from_ymd_opt(year, month, day)?))
        }
        None => year_less(month, day),
    }
}

/// A year-less date, rejected outright if no year could ever hold it.
fn year_less(month: u32, day: u32) -> Option<Piece> {
    // 2000 is a leap year, so Feb 29 survives here
    NaiveDate::from_ymd_opt(2000, month, day)?;
    Some(Piece::YearLess { month, day })
}

// ── Resolution ──────────────────────────────────────────────────────────────

fn resolve_single(
    piece: Piece,
    reference: NaiveDate,
    forward: bool,
) -> Option<(NaiveDate, Option<NaiveDate>)> {
    match piece {
        Piece::Date(date) | Piece::Weekday(date) => Some((date, None)),
        Piece::YearLess { month, day } => {
            Some((infer_year(month, day, reference, forward)?, None))
        }
        Piece::DayRange {
            month,
            from,
            to,
            year,
        } => {
            let start = match year {
                Some(y) => NaiveDate::from_ymd_opt(y, month, from)?,
                None => infer_year(month, from, reference, forward)?,
            };
            let end = NaiveDate::from_ymd_opt(start.year(), month, to)?;
            if end < start {
                return None;
            }
            Some((start, Some(end)))
        }
    }
}

fn resolve_range(
    first: Piece,
    second: Piece,
    reference: NaiveDate,
    forward: bool,
) -> Option<(NaiveDate, NaiveDate)> {
    let (start, end) = match (first, second) {
        (Piece::DayRange { .. }, _) | (_, Piece::DayRange { .. }) => return None,
        (Piece::YearLess { month, day }, Piece::Date(end) | Piece::Weekday(end)) => {
            let start = in_year(end.year(), month, day)?;
            let start = if start > end {
                in_year(end.year() - 1, month, day)?
            } else {
                start
            };
            (start, end)
        }
        (first, Piece::YearLess { month, day }) => {
            let (start, _) = resolve_single(first, reference, forward)?;
            let end = in_year(start.year(), month, day)?;
            let end = if end < start {
                in_year(start.year() + 1, month, day)?
            } else {
                end
            };
            (start, end)
        }
        (first, Piece::Weekday(end)) => {
            let (start, _) = resolve_single(first, reference, forward)?;
            // "friday to monday" means the monday after
            let behind = (start - end).num_days();
            let end = if behind > 0 {
                shift_days(end, (behind + 6) / 7 * 7)?
            } else {
                end
            };
            (start, end)
        }
        (Piece::Date(start) | Piece::Weekday(start), Piece::Date(end)) => (start, end),
    };
    Some(if start <= end { (start, end) } else { (end, start) })
}

fn in_year(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Place a year-less date relative to `reference`.
///
/// With forward bias: the first occurrence on or after `reference`.
/// Otherwise: the occurrence nearest to `reference`, later one on ties.
fn infer_year(month: u32, day: u32, reference: NaiveDate, forward: bool) -> Option<NaiveDate> {
    let year = reference.year();
    if forward {
        // Feb 29 can be up to eight years out across a skipped century leap year
        return (year..=year + 8)
            .filter_map(|y| in_year(y, month, day))
            .find(|d| *d >= reference);
    }
    (year - 4..=year + 4)
        .filter_map(|y| in_year(y, month, day))
        .min_by_key(|d| ((*d - reference).num_days().abs(), *d < reference))
}

/// Weekday arithmetic: "next" and "last" never land on today.
fn resolve_weekday(
    reference: NaiveDate,
    weekday: Weekday,
    modifier: Option<&str>,
    forward: bool,
) -> Option<NaiveDate> {
    let target = weekday.num_days_from_monday() as i64;
    let current = reference.weekday().num_days_from_monday() as i64;
    let days_ahead = (target - current + 7) % 7;
    let days_back = (current - target + 7) % 7;

    let delta = match modifier {
        Some("next") | Some("coming") => {
            if days_ahead == 0 {
                7
            } else {
                days_ahead
            }
        }
        Some("last") => {
            if days_back == 0 {
                -7
            } else {
                -days_back
            }
        }
        Some("this") => target - current,
        _ if forward => days_ahead,
        _ => target - current,
    };
    shift_days(reference, delta)
}

fn offset(reference: NaiveDate, caps: &Captures<'_>, sign: i64) -> Option<NaiveDate> {
    let n: i64 = match caps.get(1)?.as_str() {
        "a" | "an" | "one" => 1,
        digits => digits.parse().ok()?,
    };
    let unit = caps.get(2)?.as_str();
    if unit.starts_with("day") {
        shift_days(reference, sign * n)
    } else if unit.starts_with("week") {
        shift_days(reference, sign * n * 7)
    } else {
        add_months(reference, i32::try_from(sign * n).ok()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Sunday, June 15 2025
    fn reference() -> NaiveDate {
        date(2025, 6, 15)
    }

    fn recognize(text: &str) -> Vec<Recognized> {
        BuiltinRecognizer.recognize(text, reference(), RecognizeOptions::default())
    }

    fn recognize_forward(text: &str) -> Vec<Recognized> {
        BuiltinRecognizer.recognize(
            text,
            reference(),
            RecognizeOptions {
                forward_date_bias: true,
            },
        )
    }

    #[test]
    fn test_iso_date() {
        let r = recognize("2025-09-27");
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].start, date(2025, 9, 27));
        assert_eq!(r[0].end, None);
        assert_eq!(r[0].matched_text, "2025-09-27");
    }

    #[test]
    fn test_iso_date_with_slashes_not_split() {
        let r = recognize("2025/09/27");
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].start, date(2025, 9, 27));
    }

    #[test]
    fn test_invalid_iso_date_dropped() {
        assert!(recognize("2025-13-45").is_empty());
        assert!(recognize("feb 30").is_empty());
    }

    #[test]
    fn test_month_day_with_year() {
        let r = recognize("May 12th, 2026");
        assert_eq!(r[0].start, date(2026, 5, 12));
    }

    #[test]
    fn test_day_of_month() {
        let r = recognize("the 3rd of sept 2025");
        assert_eq!(r[0].start, date(2025, 9, 3));
    }

    #[test]
    fn test_yearless_nearest_without_bias() {
        // May 12 is closer to June 15 2025 than May 12 2026
        let r = recognize("may 12");
        assert_eq!(r[0].start, date(2025, 5, 12));
    }

    #[test]
    fn test_yearless_forward_bias() {
        let r = recognize_forward("may 12");
        assert_eq!(r[0].start, date(2026, 5, 12));
        // Today counts as on-or-after
        let r = recognize_forward("june 15");
        assert_eq!(r[0].start, date(2025, 6, 15));
    }

    #[test]
    fn test_feb_29_forward_bias_finds_leap_year() {
        let r = recognize_forward("feb 29");
        assert_eq!(r[0].start, date(2028, 2, 29));
    }

    #[test]
    fn test_us_numeric_dates() {
        assert_eq!(recognize("5/12/2025")[0].start, date(2025, 5, 12));
        assert_eq!(recognize("5/12/25")[0].start, date(2025, 5, 12));
        assert_eq!(recognize("6/20")[0].start, date(2025, 6, 20));
    }

    #[test]
    fn test_compact_day_range() {
        let r = recognize("may 12-20, 2025");
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].start, date(2025, 5, 12));
        assert_eq!(r[0].end, Some(date(2025, 5, 20)));
    }

    #[test]
    fn test_backwards_compact_day_range_dropped() {
        assert!(recognize("may 20-12").iter().all(|r| r.end.is_none()));
    }

    #[test]
    fn test_joined_range_with_dash() {
        let r = recognize("2025-06-01 – 2025-06-10");
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].start, date(2025, 6, 1));
        assert_eq!(r[0].end, Some(date(2025, 6, 10)));
        assert_eq!(r[0].matched_text, "2025-06-01 – 2025-06-10");
    }

    #[test]
    fn test_joined_range_with_words() {
        let r = recognize("from june 3 to june 9");
        assert_eq!(r[0].start, date(2025, 6, 3));
        assert_eq!(r[0].end, Some(date(2025, 6, 9)));

        let r = recognize("between 2025-07-01 and 2025-07-20");
        assert_eq!(r[0].start, date(2025, 7, 1));
        assert_eq!(r[0].end, Some(date(2025, 7, 20)));
    }

    #[test]
    fn test_and_without_between_is_two_dates() {
        let r = recognize("2025-07-01 and 2025-07-20");
        assert_eq!(r.len(), 2);
        assert!(r.iter().all(|x| x.end.is_none()));
    }

    #[test]
    fn test_yearless_range_end_rolls_over() {
        let r = recognize("dec 28 2025 - jan 3");
        assert_eq!(r[0].start, date(2025, 12, 28));
        assert_eq!(r[0].end, Some(date(2026, 1, 3)));
    }

    #[test]
    fn test_yearless_range_start_takes_end_year() {
        let r = recognize("dec 28 - jan 3, 2026");
        assert_eq!(r[0].start, date(2025, 12, 28));
        assert_eq!(r[0].end, Some(date(2026, 1, 3)));
    }

    #[test]
    fn test_weekday_references() {
        // Reference is a Sunday
        assert_eq!(recognize("next friday")[0].start, date(2025, 6, 20));
        assert_eq!(recognize("last friday")[0].start, date(2025, 6, 13));
        assert_eq!(recognize("this friday")[0].start, date(2025, 6, 13));
        assert_eq!(recognize("next sunday")[0].start, date(2025, 6, 22));
        assert_eq!(recognize_forward("friday")[0].start, date(2025, 6, 20));
        assert_eq!(recognize_forward("sunday")[0].start, date(2025, 6, 15));
    }

    #[test]
    fn test_weekday_range_end_rolls_forward() {
        // Reference is a Sunday: friday is Jun 13, monday is Jun 9
        let r = recognize("friday to monday");
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].start, date(2025, 6, 13));
        assert_eq!(r[0].end, Some(date(2025, 6, 16)));

        // Wednesday reference
        let r = BuiltinRecognizer.recognize(
            "friday to monday",
            date(2025, 6, 18),
            RecognizeOptions::default(),
        );
        assert_eq!(r[0].start, date(2025, 6, 20));
        assert_eq!(r[0].end, Some(date(2025, 6, 23)));

        let r = recognize("2025-09-01 until friday");
        assert_eq!(r[0].end, Some(date(2025, 9, 5)));
    }

    #[test]
    fn test_date_range_ends_still_reordered() {
        let r = recognize("2025-07-09 to 2025-07-03");
        assert_eq!(r[0].start, date(2025, 7, 3));
        assert_eq!(r[0].end, Some(date(2025, 7, 9)));
    }

    #[test]
    fn test_offsets() {
        assert_eq!(recognize("in 3 days")[0].start, date(2025, 6, 18));
        assert_eq!(recognize("2 weeks ago")[0].start, date(2025, 6, 1));
        assert_eq!(recognize("a month from now")[0].start, date(2025, 7, 15));
        assert_eq!(recognize("yesterday")[0].start, date(2025, 6, 14));
    }

    #[test]
    fn test_results_ordered_by_position() {
        let r = recognize("tomorrow or 2025-01-01");
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].start, date(2025, 6, 16));
        assert_eq!(r[1].start, date(2025, 1, 1));
    }

    #[test]
    fn test_nothing_recognized() {
        assert!(recognize("asdlkjasd").is_empty());
        assert!(recognize("june").is_empty());
        assert!(recognize("may 2025").is_empty());
        assert!(recognize("").is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(recognize("MAY 12, 2025")[0].start, date(2025, 5, 12));
    }
}
