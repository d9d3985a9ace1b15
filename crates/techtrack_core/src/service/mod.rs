//! Core use-case services.
//!
//! # Responsibility
//! - Own the technology store and its mutation contracts.
//! - Provide selection and draft-editing state used by front ends.
//! - Keep front ends decoupled from storage details.

pub mod bulk;
pub mod draft;
pub mod progress;
pub mod technology_store;
