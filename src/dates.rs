// 📅 Date Utilities - opening dates as M/D/YYYY strings
//
// Clinic records carry their opening date as free text. Anything that is not
// a real calendar date in M/D/YYYY form parses to None and is treated as
// "no date" by the filter engine.

use chrono::{Datelike, NaiveDate};

/// Parse an `M/D/YYYY` string (leading zeros allowed) into a date.
///
/// Returns None for empty input, the wrong number of parts, non-numeric
/// parts, or impossible dates such as 2/30/2025. Out-of-range days are not
/// rolled over into the next month; such a clinic counts as undated.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() != 3 {
        return None;
    }

    let month: u32 = parts[0].trim().parse().ok()?;
    let day: u32 = parts[1].trim().parse().ok()?;
    let year: i32 = parts[2].trim().parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Format a date as `M/D/YYYY` without zero padding.
pub fn format_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// Format a date as `YYYY-MM-DD`, the value shape of an HTML date input.
pub fn to_input_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` date-input value. Empty input means "no bound".
pub fn from_input_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

// ============================================================================
// TESTS
// ============================================================================
