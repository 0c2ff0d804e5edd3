use crate::imports::*;
use crate::macros::*;

const ISO8601_DATE_FORMAT: &[TimeFormat] = format_description!("[year]-[month]-[day]");

pub fn format_iso8601_date(date: Date) -> String {
    date.format(ISO8601_DATE_FORMAT).expect("iso8601 date to format")
}

pub fn parse_iso8601_date(input: &str) -> Result<Date> {
    Date::parse(input, ISO8601_DATE_FORMAT).context("Invalid date format (expect YYYY-MM-DD)")
}

/// Rewrites the date notations the vendors use (`2026-01-11T00:00:00Z`, `2026/1/11`,
/// `2026年1月11日`) as `YYYY-MM-DD`. Text with no recognisable date is returned trimmed.
pub fn normalize_event_date(text: &str) -> String {
    let text = text.trim();
    match regex!(r"(\d{4})\s*[-/年.]\s*(\d{1,2})\s*[-/月.]\s*(\d{1,2})").captures(text) {
        Some(captures) => format!("{}-{:0>2}-{:0>2}", &captures[1], &captures[2], &captures[3]),
        None => text.to_string(),
    }
}

pub fn parse_event_date(text: &str) -> Option<Date> {
    parse_iso8601_date(&normalize_event_date(text)).ok()
}

/// First run of digits in `text`, ignoring thousands separators.
pub fn parse_count(text: &str) -> Option<u64> {
    let text = text.replace(',', "");
    regex!(r"\d+").find(&text).and_then(|m| m.as_str().parse().ok())
}

/// Collapses whitespace runs and trims.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().join(" ")
}
