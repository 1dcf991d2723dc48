use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::format_amount;
use crate::ledger::ParsedFile;

pub const HEADER: &str = "Financial Year,Cash Balance";

/// Only rows booked against exactly this account are summarized.
pub const CASH_ACCOUNT: &str = "Cash";

/// Bucket for rows whose date cannot be read
pub const UNKNOWN_YEAR: &str = "NaN";

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%B %d, %Y",
];
const YEAR_MONTH_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Calendar year of a ledger date.
///
/// Accepts a bare year (`2023`), a year and month (`2023-01`), full dates
/// and timestamps. Timestamps carrying an offset are moved to the local
/// timezone first; everything else is taken as local already.
pub fn fiscal_year(date: &str) -> Option<i32> {
    let date = date.trim();

    if date.len() == 4 && date.bytes().all(|b| b.is_ascii_digit()) {
        return date.parse().ok();
    }

    let month_start = format!("{date}{}", if date.contains('/') { "/01" } else { "-01" });
    if let Some(day) = YEAR_MONTH_FORMATS
        .iter()
        .filter(|_| date.len() == 7)
        .find_map(|fmt| NaiveDate::parse_from_str(&month_start, fmt).ok())
    {
        return Some(day.year());
    }

    if let Some(day) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
    {
        return Some(day.year());
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(date) {
        return Some(timestamp.with_timezone(&Local).year());
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(date, fmt).ok())
        .map(|timestamp| timestamp.year())
}

/// Cash movement per year bucket, ordered by the bucket's text
pub fn cash_by_year(files: &[Arc<ParsedFile>]) -> BTreeMap<String, f64> {
    let mut buckets = BTreeMap::new();
    for row in files
        .iter()
        .flat_map(|file| file.rows.iter())
        .filter(|row| row.account == CASH_ACCOUNT)
    {
        let bucket = match fiscal_year(&row.date) {
            Some(year) => year.to_string(),
            None => {
                debug!(date = %row.date, "Unreadable ledger date");
                UNKNOWN_YEAR.to_string()
            }
        };
        *buckets.entry(bucket).or_insert(0.0) += row.net();
    }
    buckets
}

pub fn yearly_cash_summary(files: &[Arc<ParsedFile>]) -> Vec<String> {
    std::iter::once(HEADER.to_string())
        .chain(
            cash_by_year(files)
                .iter()
                .map(|(year, balance)| format!("{year},{}", format_amount(*balance))),
        )
        .collect()
}
