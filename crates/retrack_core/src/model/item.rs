//! Tracked item domain model.
//!
//! # Responsibility
//! - Define the canonical record for one recurring replacement/service task.
//! - Validate the invariants every persisted item must satisfy.
//!
//! # Invariants
//! - `id` is stable and never reused for another item.
//! - `name` is non-blank after trimming.
//! - `interval_days >= 1`.
//!
//! # See also
//! - reconcile.rs for the derived `days_left` / `next_date` values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a tracked item.
pub type ItemId = Uuid;

/// Validation errors for item invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemValidationError {
    /// The nil UUID is reserved and never a valid item id.
    NilId,
    /// Name is empty or whitespace-only.
    BlankName,
    /// Interval must be at least one day.
    ZeroInterval,
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "item id must not be nil"),
            Self::BlankName => write!(f, "item name must not be blank"),
            Self::ZeroInterval => write!(f, "replacement interval must be at least 1 day"),
        }
    }
}

impl Error for ItemValidationError {}

/// One recurring task/object with its service interval.
///
/// Serialized with camelCase keys (`replacementInterval`, `lastReplaced`).
/// Only the key names carry over from the browser-era layout. Ids must be
/// UUID strings and dates plain `YYYY-MM-DD`, so records with numeric ids
/// or full timestamps do not decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Canonical catalog label, `None` when uncategorized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Days between required services.
    #[serde(rename = "replacementInterval")]
    pub interval_days: u32,
    /// Date of the last service event.
    pub last_replaced: NaiveDate,
    /// Cosmetic action label ("Replace", "Check", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
}

impl Item {
    /// Creates a new item with a generated stable ID.
    ///
    /// # Errors
    /// - `BlankName` when `name` is whitespace-only.
    /// - `ZeroInterval` when `interval_days == 0`.
    pub fn new(
        name: impl Into<String>,
        interval_days: u32,
        last_replaced: NaiveDate,
    ) -> Result<Self, ItemValidationError> {
        Self::with_id(Uuid::new_v4(), name, interval_days, last_replaced)
    }

    /// Creates an item with a caller-provided ID.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(
        id: ItemId,
        name: impl Into<String>,
        interval_days: u32,
        last_replaced: NaiveDate,
    ) -> Result<Self, ItemValidationError> {
        let item = Self {
            id,
            name: name.into(),
            category: None,
            interval_days,
            last_replaced,
            verb: None,
        };
        item.validate()?;
        Ok(item)
    }

    /// Checks the item invariants.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id.is_nil() {
            return Err(ItemValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(ItemValidationError::BlankName);
        }
        if self.interval_days == 0 {
            return Err(ItemValidationError::ZeroInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Item, ItemValidationError};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_generates_id_and_leaves_labels_empty() {
        let item = Item::new("Water filter", 90, date(2024, 3, 1)).unwrap();
        assert!(!item.id.is_nil());
        assert_eq!(item.category, None);
        assert_eq!(item.verb, None);
    }

    #[test]
    fn with_id_rejects_invariant_violations() {
        let day = date(2024, 3, 1);
        assert_eq!(
            Item::with_id(Uuid::nil(), "x", 1, day).unwrap_err(),
            ItemValidationError::NilId
        );
        assert_eq!(
            Item::new(" \t", 1, day).unwrap_err(),
            ItemValidationError::BlankName
        );
        assert_eq!(
            Item::new("x", 0, day).unwrap_err(),
            ItemValidationError::ZeroInterval
        );
    }
}
