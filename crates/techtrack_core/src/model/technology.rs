//! Technology domain model.
//!
//! # Responsibility
//! - Define the canonical record tracked by the learning-progress store.
//! - Expose the status enum together with its display metadata.
//! - Compute the overdue projection from `deadline` and `status`.
//!
//! # Invariants
//! - `id` is stable and never reused for another technology.
//! - `title` is non-empty after trimming.
//! - `deadline`, when set, has a year within the supported bounds.
//! - Empty `notes` means "no notes".

use crate::validation::{MAX_DEADLINE_YEAR, MIN_DEADLINE_YEAR};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one tracked technology.
pub type TechnologyId = Uuid;

/// Learning lifecycle state.
///
/// Any transition between members is allowed; there is no enforced order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TechnologyStatus {
    /// Tracked but not started yet.
    #[default]
    NotStarted,
    /// Currently being learned.
    InProgress,
    /// Learned.
    Completed,
}

impl TechnologyStatus {
    /// All members in lifecycle display order.
    pub const ALL: [TechnologyStatus; 3] = [
        TechnologyStatus::NotStarted,
        TechnologyStatus::InProgress,
        TechnologyStatus::Completed,
    ];

    /// Stable wire name used in persisted snapshots and commands.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    /// Human-readable label consumed by views.
    pub fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
        }
    }

    /// Display colour (hex RGB) consumed by views.
    pub fn color(self) -> &'static str {
        match self {
            Self::NotStarted => "#9e9e9e",
            Self::InProgress => "#ff9800",
            Self::Completed => "#4caf50",
        }
    }

    /// Resolves a wire name. Matching is exact and case-sensitive.
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }
}

impl Display for TechnologyStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External learning resource attached to a technology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub title: String,
    pub url: String,
}

impl Resource {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    /// Text shown for the link; falls back to the URL for untitled entries.
    pub fn display_label(&self) -> &str {
        if self.title.trim().is_empty() {
            self.url.as_str()
        } else {
            self.title.as_str()
        }
    }
}

/// Canonical record for one tracked technology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technology {
    pub id: TechnologyId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TechnologyStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    /// Serialized as `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
}

impl Technology {
    /// Creates a technology with a generated stable ID.
    ///
    /// # Invariants
    /// - Status starts as `NotStarted`.
    /// - Optional fields start empty.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title)
    }

    /// Creates a technology with a caller-provided stable ID.
    ///
    /// Used by seed and import paths where identity already exists.
    pub fn with_id(id: TechnologyId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            status: TechnologyStatus::NotStarted,
            notes: String::new(),
            deadline: None,
            resources: Vec::new(),
        }
    }

    /// Validates record-level invariants.
    ///
    /// # Errors
    /// - `EmptyTitle` when `title` is blank.
    /// - `DeadlineOutOfRange` when `deadline` year is outside the bounds.
    pub fn validate(&self) -> Result<(), TechnologyValidationError> {
        if self.title.trim().is_empty() {
            return Err(TechnologyValidationError::EmptyTitle);
        }
        if let Some(deadline) = self.deadline {
            if !(MIN_DEADLINE_YEAR..=MAX_DEADLINE_YEAR).contains(&deadline.year()) {
                return Err(TechnologyValidationError::DeadlineOutOfRange(deadline));
            }
        }
        Ok(())
    }

    /// Whether the record has user notes.
    pub fn has_notes(&self) -> bool {
        !self.notes.is_empty()
    }

    /// Overdue when the deadline is before `today` and the technology is not
    /// completed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TechnologyStatus::Completed
            && self.deadline.is_some_and(|deadline| deadline < today)
    }

    /// Deadline rendered the way callers edit it (`""` when absent).
    pub fn deadline_text(&self) -> String {
        self.deadline
            .map(|deadline| deadline.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

/// Record-level validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TechnologyValidationError {
    EmptyTitle,
    DeadlineOutOfRange(NaiveDate),
}

impl Display for TechnologyValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "technology title must not be empty"),
            Self::DeadlineOutOfRange(date) => write!(
                f,
                "deadline {date} is outside {MIN_DEADLINE_YEAR}..={MAX_DEADLINE_YEAR}"
            ),
        }
    }
}

impl Error for TechnologyValidationError {}

#[cfg(test)]
mod tests {
    use super::{Resource, Technology, TechnologyStatus, TechnologyValidationError};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_technology_defaults_to_not_started() {
        let tech = Technology::new("Rust");
        assert_eq!(tech.status, TechnologyStatus::NotStarted);
        assert!(!tech.has_notes());
        assert!(tech.deadline.is_none());
    }

    #[test]
    fn overdue_requires_past_deadline_and_open_status() {
        let today = date(2025, 6, 1);
        let mut tech = Technology::new("Docker");
        assert!(!tech.is_overdue(today));

        tech.deadline = Some(date(2025, 5, 31));
        assert!(tech.is_overdue(today));

        tech.status = TechnologyStatus::Completed;
        assert!(!tech.is_overdue(today));

        tech.status = TechnologyStatus::InProgress;
        tech.deadline = Some(today);
        assert!(!tech.is_overdue(today));
    }

    #[test]
    fn validate_rejects_blank_title_and_out_of_range_deadline() {
        let blank = Technology::new("   ");
        assert_eq!(blank.validate(), Err(TechnologyValidationError::EmptyTitle));

        let mut far = Technology::new("COBOL");
        far.deadline = Some(date(1899, 12, 31));
        assert!(matches!(
            far.validate(),
            Err(TechnologyValidationError::DeadlineOutOfRange(_))
        ));
    }

    #[test]
    fn status_wire_names_roundtrip() {
        for status in TechnologyStatus::ALL {
            assert_eq!(TechnologyStatus::from_wire(status.as_str()), Some(status));
        }
        assert_eq!(TechnologyStatus::from_wire("completed"), None);
    }

    #[test]
    fn serializes_with_camel_case_and_omits_empty_fields() {
        let mut tech = Technology::new("TypeScript");
        tech.status = TechnologyStatus::InProgress;
        tech.deadline = Some(date(2024, 2, 29));
        let value = serde_json::to_value(&tech).unwrap();

        assert_eq!(value["status"], "IN_PROGRESS");
        assert_eq!(value["deadline"], "2024-02-29");
        assert!(value.get("notes").is_none());
        assert!(value.get("resources").is_none());
        assert!(value.get("description").is_none());
    }

    #[test]
    fn resource_label_falls_back_to_url() {
        assert_eq!(Resource::new("", "https://a.dev").display_label(), "https://a.dev");
        assert_eq!(Resource::new("Book", "https://a.dev").display_label(), "Book");
    }
}
