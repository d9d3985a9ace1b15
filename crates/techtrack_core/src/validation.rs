//! Input validation for deadline and status values.
//!
//! # Responsibility
//! - Decide whether user-typed deadline text may be committed.
//! - Decide whether a status string names a known lifecycle state.
//!
//! # Invariants
//! - Functions are pure and never panic on arbitrary input.
//! - Empty deadline text means "clear" and is always accepted.

use crate::model::technology::TechnologyStatus;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Earliest accepted deadline year.
pub const MIN_DEADLINE_YEAR: i32 = 1900;
/// Latest accepted deadline year.
pub const MAX_DEADLINE_YEAR: i32 = 2100;

const DEADLINE_FORMAT: &str = "%Y-%m-%d";

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid iso date regex"));

/// Deadline rejection reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadlineError {
    /// Text does not have the `YYYY-MM-DD` shape.
    Malformed(String),
    /// Year is outside `MIN_DEADLINE_YEAR..=MAX_DEADLINE_YEAR`.
    YearOutOfRange(i32),
    /// Shape is right but the day does not exist (e.g. `2023-02-29`).
    NotACalendarDate(String),
}

impl Display for DeadlineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(value) => {
                write!(f, "deadline `{value}` is not in YYYY-MM-DD format")
            }
            Self::YearOutOfRange(year) => write!(
                f,
                "deadline year {year} is outside {MIN_DEADLINE_YEAR}..={MAX_DEADLINE_YEAR}"
            ),
            Self::NotACalendarDate(value) => {
                write!(f, "deadline `{value}` is not a real calendar date")
            }
        }
    }
}

impl Error for DeadlineError {}

/// Status rejection reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    Unknown(String),
}

impl Display for StatusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(value) => write!(
                f,
                "unknown status `{value}`; expected NOT_STARTED|IN_PROGRESS|COMPLETED"
            ),
        }
    }
}

impl Error for StatusError {}

/// Parses deadline input.
///
/// Returns `Ok(None)` for empty input (clear), `Ok(Some(date))` for a valid
/// bounded calendar date.
pub fn parse_deadline(text: &str) -> Result<Option<NaiveDate>, DeadlineError> {
    if text.is_empty() {
        return Ok(None);
    }
    if !ISO_DATE_RE.is_match(text) {
        return Err(DeadlineError::Malformed(text.to_string()));
    }

    // Shape is guaranteed by the regex, so the first four bytes are digits.
    let year: i32 = text[..4]
        .parse()
        .map_err(|_| DeadlineError::Malformed(text.to_string()))?;
    if !(MIN_DEADLINE_YEAR..=MAX_DEADLINE_YEAR).contains(&year) {
        return Err(DeadlineError::YearOutOfRange(year));
    }

    NaiveDate::parse_from_str(text, DEADLINE_FORMAT)
        .map(Some)
        .map_err(|_| DeadlineError::NotACalendarDate(text.to_string()))
}

/// Whether `text` may be committed as a deadline (including clearing).
pub fn is_valid_deadline(text: &str) -> bool {
    parse_deadline(text).is_ok()
}

/// Parses a status wire name.
pub fn parse_status(value: &str) -> Result<TechnologyStatus, StatusError> {
    TechnologyStatus::from_wire(value).ok_or_else(|| StatusError::Unknown(value.to_string()))
}

/// Whether `value` is a member of the status enum.
pub fn is_known_status(value: &str) -> bool {
    TechnologyStatus::from_wire(value).is_some()
}

#[cfg(test)]
mod tests {
    use super::{
        is_known_status, is_valid_deadline, parse_deadline, parse_status, DeadlineError,
    };
    use crate::model::technology::TechnologyStatus;
    use chrono::NaiveDate;

    #[test]
    fn accepts_empty_and_valid_dates() {
        assert!(is_valid_deadline(""));
        assert!(is_valid_deadline("2024-02-29"));
        assert!(is_valid_deadline("1900-01-01"));
        assert!(is_valid_deadline("2100-12-31"));
        assert_eq!(
            parse_deadline("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(parse_deadline("").unwrap(), None);
    }

    #[test]
    fn rejects_impossible_calendar_dates() {
        assert_eq!(
            parse_deadline("2024-02-30"),
            Err(DeadlineError::NotACalendarDate("2024-02-30".to_string()))
        );
        assert!(!is_valid_deadline("2023-02-29"));
        assert!(!is_valid_deadline("2024-13-01"));
        assert!(!is_valid_deadline("2024-00-10"));
    }

    #[test]
    fn rejects_years_outside_bounds() {
        assert_eq!(
            parse_deadline("1899-12-31"),
            Err(DeadlineError::YearOutOfRange(1899))
        );
        assert_eq!(
            parse_deadline("2101-01-01"),
            Err(DeadlineError::YearOutOfRange(2101))
        );
    }

    #[test]
    fn rejects_partial_and_padded_input() {
        for input in ["2024", "2024-1-5", "20240105", " 2024-01-05", "2024-01-05T00:00", "abc"] {
            assert!(
                matches!(parse_deadline(input), Err(DeadlineError::Malformed(_))),
                "{input} should be malformed"
            );
        }
    }

    #[test]
    fn status_membership_is_exact() {
        assert!(is_known_status("COMPLETED"));
        assert!(is_known_status("NOT_STARTED"));
        assert!(!is_known_status("BOGUS"));
        assert!(!is_known_status("in_progress"));
        assert!(!is_known_status(""));
        assert_eq!(parse_status("IN_PROGRESS"), Ok(TechnologyStatus::InProgress));
    }
}
