//! # time-intent
//!
//! Deterministic natural-language time-intent parsing.
//!
//! Turns short phrases typed into a date search box ("week of May 12",
//! "Jun–Sep", "next 2 weeks", "Q3") into a normalized [`TimeIntent`]: a
//! window kind (day, week, or month), the calendar months it touches, an
//! optional explicit date span, and a display label. The caller supplies
//! "now", so the same input always yields the same intent.
//!
//! ## Modules
//!
//! - [`parser`]: the ordered strategy chain and its options
//! - [`recognizer`]: the pluggable general-date recognizer and its built-in implementation
//! - [`intent`]: the [`TimeIntent`] output type and its shape rules
//! - [`range`]: concrete query ranges and history windows derived from an intent
//! - [`calendar`]: week, month, and quarter arithmetic
//! - [`error`]: error types

pub mod calendar;
pub mod error;
pub mod intent;
pub mod parser;
pub mod range;
pub mod recognizer;

pub use calendar::WeekStart;
pub use error::IntentError;
pub use intent::{month_set_label, TimeIntent, WindowKind};
pub use parser::{
    parse_intent, parse_intent_with_options, parse_reference, parse_timezone, resolve_intent,
    IntentParser, ParseOptions, MAX_INPUT_CHARS,
};
pub use range::{history_years, QueryRange};
pub use recognizer::{BuiltinRecognizer, DateRecognizer, RecognizeOptions, Recognized};
