//! Durable slot repository abstractions and implementations.
//!
//! # Responsibility
//! - Define the key/value slot contract the persistence adapter writes to.
//! - Isolate SQLite query details from snapshot encoding.
//!
//! # Invariants
//! - A slot write replaces the whole value in one statement.
//! - Reads observe exactly the last successful write for that key.

pub mod slot_repo;
