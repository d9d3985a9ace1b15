//! Access gating for account-sensitive store operations.
//!
//! # Responsibility
//! - Define the authentication capability injected into the store.
//! - Derive that capability from the durable session slot.
//!
//! # Invariants
//! - Guards are consulted on every gated call; results are never cached.
//! - A missing or unreadable session is treated as unauthenticated.

pub mod guard;
pub mod session;
