//! Whole-collection snapshot persistence.
//!
//! # Responsibility
//! - Own the persisted technology schema (`snapshot`).
//! - Load the collection from one durable slot, falling back to the seed.
//! - Save the full collection on every mutation.
//!
//! # Invariants
//! - `load` never fails the caller; storage and decode problems degrade to
//!   the seed collection plus a diagnostic.
//! - Snapshots are full rewrites; there is no delta persistence.

pub mod adapter;
pub mod seed;
pub mod snapshot;
