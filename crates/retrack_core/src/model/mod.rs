//! Domain model for tracked recurring items.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every item is identified by a stable `ItemId`.
//! - Deletion is a hard removal; there is no tombstone or history.

pub mod item;
