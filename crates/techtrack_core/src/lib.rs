//! Core domain logic for TechTrack, a learning-progress tracker.
//! This crate owns the technology collection, its validation rules and
//! its durable snapshot; front ends only call into it.

pub mod access;
pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod repo;
pub mod service;
pub mod validation;

pub use access::guard::{AccessDenied, AccessGuard, AllowAll, DenyAll, GatedOperation};
pub use access::session::{SessionError, SessionGuard, SessionState};
pub use config::{ConfigError, TrackerConfig};
pub use db::{open_db, open_db_in_memory, OpenError, OpenResult};
pub use export::{export_file_name, export_snapshot, ExportDocument, EXPORT_FORMAT_VERSION};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::technology::{
    Resource, Technology, TechnologyId, TechnologyStatus, TechnologyValidationError,
};
pub use persistence::adapter::{
    LoadOutcome, LoadSource, PersistenceWarning, SnapshotPersistence, TechnologyPersistence,
};
pub use repo::slot_repo::{
    InMemorySlotRepository, RepoError, RepoResult, SlotRepository, SqliteSlotRepository,
};
pub use service::bulk::{BulkEdit, BulkEditError, BulkSelection};
pub use service::draft::{DetailDraft, DraftSave};
pub use service::progress::ProgressSummary;
pub use service::technology_store::{
    BulkOutcome, ChangeKind, Mutation, NewTechnology, StoreError, StoreEvent, SubscriptionId,
    TechnologyStore,
};
pub use validation::{parse_deadline, parse_status, DeadlineError, StatusError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
