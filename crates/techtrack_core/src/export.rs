//! Portable export document for downloads and backups.
//!
//! # Responsibility
//! - Turn the in-memory collection into a self-describing document.
//!
//! # Invariants
//! - Export is deterministic for a given collection and has no side effects.
//! - Export documents are accepted by the snapshot decoder, so re-loading an
//!   export reconstructs an equivalent collection.

use crate::model::technology::Technology;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Current export envelope version.
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// Exported collection envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub format_version: u32,
    pub technology_count: usize,
    pub technologies: Vec<Technology>,
}

impl ExportDocument {
    /// Pretty-printed JSON, as written to download files.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Builds an export document from the current collection.
pub fn export_snapshot(technologies: &[Technology]) -> ExportDocument {
    ExportDocument {
        format_version: EXPORT_FORMAT_VERSION,
        technology_count: technologies.len(),
        technologies: technologies.to_vec(),
    }
}

/// Suggested download file name for an export made on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("technologies-{}.json", date.format("%Y-%m-%d"))
}
