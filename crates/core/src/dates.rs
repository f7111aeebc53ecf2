//! Normalization of the warehouse's inconsistent date strings.
//!
//! The ODS exports dates as text in several layouts. Each accepted layout
//! is tried in a fixed order and the first one that parses wins. Strings
//! such as `03/04/2025` are ambiguous between day-first and month-first;
//! day-first is tried first and no locale detection is attempted.

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::types::Timestamp;
use crate::value::SourceValue;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Text the source driver emits for a missing value in some exports.
pub const NONE_LITERAL: &str = "None";

/// Accepted date-time layouts, in priority order.
pub const DATETIME_FORMATS: &[&str] = &["%d/%m/%Y %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Accepted date-only layouts, in priority order. Tried after
/// [`DATETIME_FORMATS`]; a match is taken as midnight.
pub const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%m/%d/%Y"];

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Convert a raw source value into a point in time.
///
/// Returns `None` for SQL `NULL`, blank text, the literal `"None"`, and for
/// anything that matches none of the accepted layouts. Parsed wall-clock
/// values are taken as UTC. Never fails.
pub fn normalize_date(raw: &SourceValue) -> Option<Timestamp> {
    let rendered = raw.render()?;
    parse_date_str(&rendered)
}

/// String form of [`normalize_date`].
pub fn parse_date_str(raw: &str) -> Option<Timestamp> {
    let text = raw.trim();
    if text.is_empty() || text == NONE_LITERAL || !has_accepted_shape(text) {
        return None;
    }

    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    Some(Utc.from_utc_datetime(&naive))
}

/// Structural check run before the layouts are tried.
///
/// chrono's `%Y` takes any number of digits and an optional sign, so
/// `01/02/25` would otherwise parse as year 25. Years must have exactly four
/// digits; day, month and time fields one or two.
fn has_accepted_shape(text: &str) -> bool {
    let (date, time) = match text.split_once(' ') {
        Some((date, time)) => (date, Some(time)),
        None => (text, None),
    };

    let date_ok = if date.contains('/') {
        segments_match(date, '/', &[1..=2, 1..=2, 4..=4])
    } else {
        segments_match(date, '-', &[4..=4, 1..=2, 1..=2])
    };

    date_ok && time.map_or(true, |t| segments_match(t, ':', &[1..=2, 1..=2, 1..=2]))
}

fn segments_match(text: &str, sep: char, widths: &[std::ops::RangeInclusive<usize>]) -> bool {
    let parts: Vec<&str> = text.split(sep).collect();
    parts.len() == widths.len()
        && parts.iter().zip(widths).all(|(part, width)| {
            width.contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
        })
}
