//! Persistence collaborators.
//!
//! # Responsibility
//! - Define the key-value contract the item store persists through.
//! - Isolate SQLite details from store/service orchestration.
//!
//! # Invariants
//! - One key holds one complete serialized value; writes replace it whole.

pub mod kv_store;
