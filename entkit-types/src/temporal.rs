//! Textual dates and times accepted wherever a temporal value may arrive
//! as text. Validation and SQL binding both go through these parsers.

use chrono::{NaiveDate, NaiveTime};

/// Parses a calendar date written as `YYYY-MM-DD`.
#[must_use]
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Parses a time of day written as `HH:MM`, `HH:MM:SS` or with fractional
/// seconds.
#[must_use]
pub fn parse_time_text(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}
