//! String formatting utilities for UI rendering.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use donorware_core::catalog::DATE_FORMAT;

/// Truncate a string to max length, adding ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return s.chars().take(max_len).collect();
    }
    let truncated: String = s.chars().take(max_len - 3).collect();
    format!("{}...", truncated)
}

/// First 8 characters of a UUID.
pub fn short_id(id: &Uuid) -> String {
    id.to_string()[..8].to_string()
}

pub fn format_datetime(dt: &DateTime<Utc>, pretty: bool) -> String {
    if pretty {
        dt.format("%Y-%m-%d %H:%M UTC").to_string()
    } else {
        dt.to_rfc3339()
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Replace newlines so a value fits on one table row.
pub fn single_line(s: &str) -> String {
    s.replace('\n', " ").replace('\r', "")
}
