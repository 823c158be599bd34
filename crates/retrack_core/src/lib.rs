//! Core domain logic for the replacement tracker.
//! This crate is the single source of truth for business invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod repo;
pub mod service;
pub mod store;
pub mod view;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Catalog, ConfigError, LabelKind, TrackerConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::item::{Item, ItemId, ItemValidationError};
pub use reconcile::{
    days_between, days_left, next_date, parse_date, DateEditDraft, DateEditError, DateParseError,
};
pub use repo::kv_store::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StorageError, StorageResult,
};
pub use service::tracker_service::{
    AddItemRequest, RenameDraft, TrackerError, TrackerResult, TrackerService,
};
pub use store::{ItemPatch, ItemStore, StoreError, StoreResult};
pub use view::{build_rows, CategoryFilter, DueStatus, ItemRow};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
