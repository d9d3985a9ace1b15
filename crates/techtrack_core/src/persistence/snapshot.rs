//! Persisted snapshot schema and codec.
//!
//! # Responsibility
//! - Encode the collection as a JSON array of technology records.
//! - Decode stored arrays and exported documents into valid records.
//! - Migrate stored records that violate current invariants.
//!
//! # Invariants
//! - Encoding a decoded canonical snapshot reproduces the same bytes.
//! - Decoded collections satisfy id uniqueness, known statuses and bounded
//!   deadlines.
//! - Only structural JSON failures are reported as corruption; record-level
//!   problems are repaired and counted.

use crate::export::EXPORT_FORMAT_VERSION;
use crate::model::technology::{Resource, Technology, TechnologyId, TechnologyStatus};
use crate::validation::parse_deadline;
use log::warn;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Namespace for ids derived from legacy non-UUID identifiers (`1`, `"react"`).
const LEGACY_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_8d3b_4c57_9e0a_b1d2_c3e4_f506);

/// Snapshot decode failure. Treated as a corrupt slot by callers.
#[derive(Debug)]
pub enum SnapshotDecodeError {
    Json(serde_json::Error),
    UnsupportedFormatVersion { found: u32, latest_supported: u32 },
}

impl Display for SnapshotDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "snapshot is not valid JSON: {err}"),
            Self::UnsupportedFormatVersion {
                found,
                latest_supported,
            } => write!(
                f,
                "snapshot format version {found} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for SnapshotDecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::UnsupportedFormatVersion { .. } => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotDecodeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Decoded collection plus the number of records that needed repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSnapshot {
    pub technologies: Vec<Technology>,
    /// Records migrated or discarded while decoding.
    pub repaired_records: usize,
}

/// Accepted top-level shapes: the persisted array or an export envelope.
///
/// Records stay untyped here so that one malformed record cannot fail the
/// whole document; each one is checked in `migrate_record`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    Records(Vec<Value>),
    Export(ExportEnvelope),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportEnvelope {
    format_version: u32,
    technologies: Vec<Value>,
}

/// Shape of one optional text field in a stored record.
enum TextField<'a> {
    Missing,
    Text(&'a str),
    WrongType,
}

fn text_field<'a>(fields: &'a Map<String, Value>, key: &str) -> TextField<'a> {
    match fields.get(key) {
        None | Some(Value::Null) => TextField::Missing,
        Some(Value::String(text)) => TextField::Text(text.as_str()),
        Some(_) => TextField::WrongType,
    }
}

/// Serializes the collection in persisted form.
pub fn encode_snapshot(technologies: &[Technology]) -> Result<String, serde_json::Error> {
    serde_json::to_string(technologies)
}

/// Decodes a persisted array or an exported document.
///
/// # Errors
/// - `Json` when the text is not one of the accepted shapes.
/// - `UnsupportedFormatVersion` for export documents from a newer build.
pub fn decode_snapshot(text: &str) -> Result<DecodedSnapshot, SnapshotDecodeError> {
    let records = match serde_json::from_str::<SnapshotDocument>(text)? {
        SnapshotDocument::Records(records) => records,
        SnapshotDocument::Export(envelope) => {
            if envelope.format_version > EXPORT_FORMAT_VERSION {
                return Err(SnapshotDecodeError::UnsupportedFormatVersion {
                    found: envelope.format_version,
                    latest_supported: EXPORT_FORMAT_VERSION,
                });
            }
            envelope.technologies
        }
    };

    let mut seen = HashSet::new();
    let mut technologies = Vec::with_capacity(records.len());
    let mut repaired_records = 0;
    for (index, record) in records.into_iter().enumerate() {
        match migrate_record(index, &record) {
            Some((technology, repaired)) => {
                if !seen.insert(technology.id) {
                    warn!(
                        "event=snapshot_repair module=persistence status=discarded index={} reason=duplicate_id",
                        index
                    );
                    repaired_records += 1;
                    continue;
                }
                if repaired {
                    repaired_records += 1;
                }
                technologies.push(technology);
            }
            None => repaired_records += 1,
        }
    }

    Ok(DecodedSnapshot {
        technologies,
        repaired_records,
    })
}

/// Returns the record and whether any field had to be repaired, or `None`
/// when the record cannot be salvaged.
fn migrate_record(index: usize, record: &Value) -> Option<(Technology, bool)> {
    let discard = |reason: &str| {
        warn!(
            "event=snapshot_repair module=persistence status=discarded index={} reason={}",
            index, reason
        );
    };

    let Some(fields) = record.as_object() else {
        discard("not_an_object");
        return None;
    };
    let Some(id) = fields.get("id").and_then(resolve_id) else {
        discard("invalid_id");
        return None;
    };
    let title = match text_field(fields, "title") {
        TextField::Text(title) if !title.trim().is_empty() => title.to_string(),
        _ => {
            discard("empty_title");
            return None;
        }
    };

    let mut repaired = false;
    let mut repair = |reason: &str| {
        warn!(
            "event=snapshot_repair module=persistence status=migrated index={} reason={}",
            index, reason
        );
        repaired = true;
    };

    let status = match text_field(fields, "status") {
        TextField::Missing => TechnologyStatus::NotStarted,
        TextField::Text(value) => match TechnologyStatus::from_wire(value) {
            Some(status) => status,
            None => {
                repair("unknown_status");
                TechnologyStatus::NotStarted
            }
        },
        TextField::WrongType => {
            repair("unknown_status");
            TechnologyStatus::NotStarted
        }
    };

    let deadline = match text_field(fields, "deadline") {
        TextField::Missing => None,
        TextField::Text(text) => match parse_deadline(text) {
            Ok(deadline) => deadline,
            Err(_) => {
                repair("invalid_deadline");
                None
            }
        },
        TextField::WrongType => {
            repair("invalid_deadline");
            None
        }
    };

    let description = match text_field(fields, "description") {
        TextField::Missing => None,
        TextField::Text(text) => Some(text.to_string()),
        TextField::WrongType => {
            repair("invalid_description");
            None
        }
    };

    let notes = match text_field(fields, "notes") {
        TextField::Missing => String::new(),
        TextField::Text(text) => text.to_string(),
        TextField::WrongType => {
            repair("invalid_notes");
            String::new()
        }
    };

    let resources = match fields.get("resources") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let kept: Vec<Resource> = items.iter().filter_map(resource_from_value).collect();
            if kept.len() != items.len() {
                repair("invalid_resource");
            }
            kept
        }
        Some(_) => {
            repair("invalid_resource");
            Vec::new()
        }
    };

    let technology = Technology {
        id,
        title,
        description,
        status,
        notes,
        deadline,
        resources,
    };
    Some((technology, repaired))
}

/// A resource needs a string `url`; a non-string `title` falls back to empty.
fn resource_from_value(value: &Value) -> Option<Resource> {
    let fields = value.as_object()?;
    let TextField::Text(url) = text_field(fields, "url") else {
        return None;
    };
    let title = match text_field(fields, "title") {
        TextField::Text(title) => title,
        TextField::Missing | TextField::WrongType => "",
    };
    Some(Resource::new(title, url))
}

fn resolve_id(value: &Value) -> Option<TechnologyId> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(
            Uuid::parse_str(text)
                .unwrap_or_else(|_| Uuid::new_v5(&LEGACY_ID_NAMESPACE, text.as_bytes())),
        ),
        Value::Number(number) => Some(Uuid::new_v5(
            &LEGACY_ID_NAMESPACE,
            number.to_string().as_bytes(),
        )),
        _ => None,
    }
}
