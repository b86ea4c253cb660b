use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use time_intent::{
    history_years, month_set_label, parse_reference, parse_timezone, IntentParser, ParseOptions,
    QueryRange, TimeIntent, WeekStart,
};

/// Shown when no strategy understands the input.
const GUIDANCE: &str =
    "Sorry, I couldn't read that. Try: \"week of 2025-06-10\", \"Jun–Sep\", or \"next 2 weeks\".";

/// Completed years of daily history behind each estimate.
const HISTORY_YEARS: u32 = 10;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "time-intent",
    version,
    about = "Turn phrases like \"week of May 12\" or \"Jun–Sep\" into concrete time windows"
)]
pub struct Cli {
    /// The phrase to parse; multiple words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,

    /// Reference instant (RFC 3339 or YYYY-MM-DD); defaults to the current time.
    #[arg(long)]
    pub now: Option<String>,

    /// First day of the week for week windows.
    #[arg(long, default_value_t = WeekStart::Monday)]
    pub week_start: WeekStart,

    /// IANA timezone used to read "today" and to build the query range.
    #[arg(long, default_value = "UTC")]
    pub timezone: String,

    /// Resolve year-less dates to their next occurrence instead of the nearest.
    #[arg(long)]
    pub forward_dates: bool,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Log parser decisions to stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    text: &'a str,
    intent: &'a TimeIntent,
    range: Option<QueryRange>,
    history: History,
}

#[derive(Debug, Serialize)]
struct History {
    first_year: i32,
    last_year: i32,
}

impl Cli {
    /// Install the stderr subscriber. `RUST_LOG` wins over `-v`.
    pub fn init_tracing(&self) {
        let default = match self.verbose {
            0 => "warn",
            1 => "time_intent=debug",
            _ => "time_intent=trace",
        };
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
            )
            .init();
    }

    pub fn run(self) -> Result<ExitCode> {
        let now = self.reference()?;
        let options = ParseOptions {
            week_start: self.week_start,
            timezone: parse_timezone(&self.timezone)?,
            forward_dates: self.forward_dates,
        };
        let text = self.text.join(" ");
        tracing::debug!(%text, %now, ?options, "parsing");

        let parser = IntentParser::new().with_options(options);
        let Some(intent) = parser.parse(&text, now) else {
            eprintln!("{GUIDANCE}");
            return Ok(ExitCode::FAILURE);
        };

        let range = QueryRange::from_intent(&intent, now, options.timezone);
        let (first_year, last_year) = history_years(now, HISTORY_YEARS);
        let report = Report {
            text: &text,
            intent: &intent,
            range,
            history: History {
                first_year,
                last_year,
            },
        };

        let stdout = io::stdout();
        let mut out = stdout.lock();
        if self.json {
            serde_json::to_writer_pretty(&mut out, &report).context("writing JSON")?;
            writeln!(out)?;
        } else {
            write_text(&mut out, &report)?;
        }
        Ok(ExitCode::SUCCESS)
    }

    fn reference(&self) -> Result<DateTime<Utc>> {
        match &self.now {
            Some(s) => Ok(parse_reference(s)?),
            None => Ok(Utc::now()),
        }
    }
}

fn write_text(out: &mut impl Write, report: &Report<'_>) -> io::Result<()> {
    let intent = report.intent;
    writeln!(out, "{}", intent.label())?;
    writeln!(out, "  window:  {}", intent.window())?;
    writeln!(out, "  months:  {}", month_set_label(intent.months()))?;
    if let (Some(start), Some(end)) = (intent.start(), intent.end()) {
        writeln!(out, "  dates:   {start} .. {end}")?;
    }
    if let Some(range) = &report.range {
        writeln!(
            out,
            "  range:   {} .. {}",
            range.start.to_rfc3339(),
            range.end.to_rfc3339()
        )?;
    }
    writeln!(
        out,
        "  history: {}-{}",
        report.history.first_year, report.history.last_year
    )
}
