// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, SecondsFormat, Utc};

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Widest offset from UTC in use anywhere (UTC+14:00).
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Calendar-day key used in document IDs and queries ("YYYY-MM-DD").
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Parse a "YYYY-MM-DD" day key.
pub fn parse_date_key(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_KEY_FORMAT).ok()
}

/// Calendar day of `at` for a client `offset_minutes` east of UTC.
///
/// Returns `None` for offsets outside +/-14h.
pub fn local_date(at: DateTime<Utc>, offset_minutes: i32) -> Option<NaiveDate> {
    if offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
        return None;
    }
    let offset = FixedOffset::east_opt(offset_minutes * 60)?;
    Some(at.with_timezone(&offset).date_naive())
}

/// First and last day of a "YYYY-MM" month.
pub fn month_bounds(raw: &str) -> Option<(NaiveDate, NaiveDate)> {
    let (year, month) = raw.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    let first = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)?;
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)?
    };
    Some((first, next_month.pred_opt()?))
}
