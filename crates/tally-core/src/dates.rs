//! Statement date parsing
//!
//! Banks export dates in a handful of layouts. `parse_date` tries the common
//! numeric layouts in a fixed order, then a set of looser layouts (timestamps,
//! month names). Anything else is "no date", which callers treat as an
//! ordinary outcome rather than an error.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Numeric layouts, tried in order. The first successful parse wins, so
/// `01/02/2024` is always January 2nd.
const PRIMARY_FORMATS: [&str; 6] = [
    "%m/%d/%Y", // 01/15/2024
    "%m-%d-%Y", // 01-15-2024
    "%Y-%m-%d", // 2024-01-15
    "%m/%d/%y", // 01/15/24
    "%m-%d-%y", // 01-15-24
    "%Y/%m/%d", // 2024/01/15
];

/// Date-only layouts for the permissive fallback (`%b` also accepts full month names)
const FALLBACK_DATE_FORMATS: [&str; 8] = [
    "%b %d, %Y", // Jan 15, 2024 / January 15, 2024
    "%b %d %Y",  // Jan 15 2024
    "%d %b %Y",  // 15 Jan 2024
    "%d-%b-%Y",  // 15-Jan-2024
    "%d-%b-%y",  // 15-Jan-24
    "%Y.%m.%d",  // 2024.01.15
    "%m.%d.%Y",  // 01.15.2024
    "%a, %b %d, %Y", // Mon, Jan 15, 2024
];

/// Date-time layouts for the permissive fallback; only the date part is kept
const FALLBACK_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
];

/// Parse a raw statement date
///
/// Returns `None` for missing, blank, or unrecognizable input. Never panics
/// and never errors.
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }

    PRIMARY_FORMATS
        .iter()
        .find_map(|fmt| parse_with(s, fmt))
        .or_else(|| parse_permissive(s))
}

/// Parse with a single layout
///
/// chrono's `%Y` accepts any number of digits, so `01/15/24` would otherwise
/// match `%m/%d/%Y` as year 24. Four-digit layouts reject such years and leave
/// them to the `%y` layouts.
fn parse_with(s: &str, fmt: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(s, fmt).ok()?;
    if fmt.contains("%Y") && !(1000..=9999).contains(&date.year()) {
        return None;
    }
    Some(date)
}

/// Looser layouts tried after the primary list
fn parse_permissive(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }

    FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            FALLBACK_DATE_FORMATS
                .iter()
                .find_map(|fmt| parse_with(s, fmt))
        })
        .or_else(|| parse_compact(s))
}

/// `20240115`
fn parse_compact(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = s[0..4].parse().ok()?;
    let month = s[4..6].parse().ok()?;
    let day = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
