//! Lenient release-date parsing.
//!
//! Release dates arrive as loosely formatted strings (`2023-04-05`,
//! `2023-04-05 00:00:00`, RFC 3339, `2023/04/05`, `04/05/2023`, or a bare
//! year). Only the calendar date matters for ordering.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

fn ymd_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})").unwrap())
}

fn mdy_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap())
}

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d{4})\s*$").unwrap())
}

/// Parse the calendar date at the start of a release-date string.
/// Returns `None` for anything that is not a valid date.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let num = |s: &str| s.parse::<u32>().ok();

    if let Some(c) = ymd_regex().captures(raw) {
        let year = c[1].parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, num(&c[2])?, num(&c[3])?);
    }
    if let Some(c) = mdy_regex().captures(raw) {
        let year = c[3].parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, num(&c[1])?, num(&c[2])?);
    }
    if let Some(c) = year_regex().captures(raw) {
        let year = c[1].parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    None
}
