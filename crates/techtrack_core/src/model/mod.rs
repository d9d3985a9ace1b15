//! Technology tracking domain model.
//!
//! # Responsibility
//! - Define the canonical technology record and its status lifecycle.
//! - Keep derived projections (overdue flag) computed, never stored.
//!
//! # Invariants
//! - Every record is identified by a stable `TechnologyId`.
//! - Status values are always members of `TechnologyStatus`.

pub mod technology;
