//! Request date validation

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Format expected by the APOD endpoint
pub const DATE_FORMAT: &str = "%Y-%m-%d";

static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Parse a strict `YYYY-MM-DD` date
///
/// chrono alone accepts single-digit months and days and longer years, so the
/// shape is checked first.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    if !DATE_SHAPE.is_match(input) {
        return None;
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT).ok()
}

/// True if `input` is a real calendar date written as `YYYY-MM-DD`
pub fn is_valid_date(input: &str) -> bool {
    parse_date(input).is_some()
}
