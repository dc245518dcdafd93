//! Academic session helpers.
//!
//! A session is written `"YYYY-YYYY"` and runs from April to March, so
//! `"2024-2025"` covers 1 April 2024 through 31 March 2025.

use crate::errors::{Error, Result};
use chrono::{Datelike, NaiveDate};

/// Session key used for a school's fallback fee schedule.
pub const DEFAULT_SESSION: &str = "default";

/// Month in which a new academic session starts.
const SESSION_START_MONTH: u32 = 4;

/// Checks that `session` is `"YYYY-YYYY"` with consecutive years, or `"default"`.
///
/// # Errors
/// Returns `Error::InvalidInput` for anything else.
pub fn validate_session(session: &str) -> Result<()> {
    if session == DEFAULT_SESSION {
        return Ok(());
    }
    let invalid = || Error::InvalidInput {
        message: format!("session must look like 2024-2025, got '{session}'"),
    };
    let (start, end) = session.split_once('-').ok_or_else(invalid)?;
    if start.len() != 4 || end.len() != 4 {
        return Err(invalid());
    }
    let start: i32 = start.parse().map_err(|_| invalid())?;
    let end: i32 = end.parse().map_err(|_| invalid())?;
    if end != start + 1 {
        return Err(invalid());
    }
    Ok(())
}

/// Returns the session a date falls in.
#[must_use]
pub fn session_for_date(date: NaiveDate) -> String {
    let start = if date.month() >= SESSION_START_MONTH {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{start}-{}", start + 1)
}

/// Two-digit year suffix used in admission numbers (`2024` -> `"24"`).
#[must_use]
pub fn year_suffix(year: i32) -> String {
    format!("{:02}", year.rem_euclid(100))
}
