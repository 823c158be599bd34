//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store mutations into user-action level APIs.
//! - Keep CLI/UI layers decoupled from persistence details.

pub mod tracker_service;
