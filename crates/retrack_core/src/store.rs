//! Ordered item collection persisted under one key.
//!
//! # Responsibility
//! - Hold the canonical item list in insertion order.
//! - Rewrite the whole serialized collection after every mutation.
//!
//! # Invariants
//! - No two items share an id.
//! - Every held item satisfies `Item::validate()`.
//! - A mutation whose write fails is rolled back in memory.
//! - Missing or corrupt persisted data loads as an empty collection.

use crate::model::item::{Item, ItemId, ItemValidationError};
use crate::repo::kv_store::{KeyValueStore, StorageError};
use chrono::NaiveDate;
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Validation(ItemValidationError),
    DuplicateId(ItemId),
    Storage(StorageError),
    Serialize(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "item id already exists: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to serialize items: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::DuplicateId(_) => None,
            Self::Storage(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<ItemValidationError> for StoreError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Partial update for one item. `None` fields are left unchanged.
///
/// `category`/`verb` use a nested option so a patch can clear the label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub category: Option<Option<String>>,
    pub interval_days: Option<u32>,
    pub last_replaced: Option<NaiveDate>,
    pub verb: Option<Option<String>>,
}

impl ItemPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = Some(category);
        self
    }

    pub fn interval_days(mut self, interval_days: u32) -> Self {
        self.interval_days = Some(interval_days);
        self
    }

    pub fn last_replaced(mut self, last_replaced: NaiveDate) -> Self {
        self.last_replaced = Some(last_replaced);
        self
    }

    pub fn verb(mut self, verb: Option<String>) -> Self {
        self.verb = Some(verb);
        self
    }

    fn apply_to(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(category) = &self.category {
            item.category = category.clone();
        }
        if let Some(interval_days) = self.interval_days {
            item.interval_days = interval_days;
        }
        if let Some(last_replaced) = self.last_replaced {
            item.last_replaced = last_replaced;
        }
        if let Some(verb) = &self.verb {
            item.verb = verb.clone();
        }
    }
}

/// Canonical item list bound to one persistence key.
pub struct ItemStore<K: KeyValueStore> {
    backend: K,
    key: String,
    items: Vec<Item>,
}

impl<K: KeyValueStore> ItemStore<K> {
    /// Loads the collection stored under `key`.
    ///
    /// # Errors
    /// - Returns `Storage` only when the backend read itself fails; absent or
    ///   unreadable content yields an empty store.
    pub fn open(backend: K, key: impl Into<String>) -> StoreResult<Self> {
        let key = key.into();
        let items = match backend.get(&key)? {
            Some(raw) => decode_items(&raw),
            None => {
                debug!("event=store_load module=store status=ok reason=absent count=0");
                Vec::new()
            }
        };
        Ok(Self {
            backend,
            key,
            items,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &K {
        &self.backend
    }

    /// Items in insertion order.
    pub fn list(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends a new item and persists the collection.
    pub fn add(&mut self, item: Item) -> StoreResult<ItemId> {
        item.validate()?;
        if self.get(item.id).is_some() {
            return Err(StoreError::DuplicateId(item.id));
        }

        let id = item.id;
        self.items.push(item);
        if let Err(err) = self.persist() {
            self.items.pop();
            return Err(err);
        }

        debug!(
            "event=item_add module=store status=ok item_id={id} count={}",
            self.items.len()
        );
        Ok(id)
    }

    /// Applies `patch` to the item with `id`.
    ///
    /// Returns `Ok(false)` without writing when no item has `id`.
    pub fn update(&mut self, id: ItemId, patch: &ItemPatch) -> StoreResult<bool> {
        let Some(index) = self.position(id) else {
            debug!("event=item_update module=store status=skipped reason=not_found item_id={id}");
            return Ok(false);
        };

        let mut patched = self.items[index].clone();
        patch.apply_to(&mut patched);
        patched.validate()?;

        let previous = std::mem::replace(&mut self.items[index], patched);
        if let Err(err) = self.persist() {
            self.items[index] = previous;
            return Err(err);
        }

        debug!("event=item_update module=store status=ok item_id={id}");
        Ok(true)
    }

    /// Removes the item with `id`.
    ///
    /// Returns `Ok(false)` without writing when no item has `id`.
    pub fn remove(&mut self, id: ItemId) -> StoreResult<bool> {
        let Some(index) = self.position(id) else {
            debug!("event=item_remove module=store status=skipped reason=not_found item_id={id}");
            return Ok(false);
        };

        let removed = self.items.remove(index);
        if let Err(err) = self.persist() {
            self.items.insert(index, removed);
            return Err(err);
        }

        debug!(
            "event=item_remove module=store status=ok item_id={id} count={}",
            self.items.len()
        );
        Ok(true)
    }

    fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn persist(&self) -> StoreResult<()> {
        let encoded = serde_json::to_string(&self.items).map_err(StoreError::Serialize)?;
        self.backend.set(&self.key, &encoded).map_err(|err| {
            warn!(
                "event=store_save module=store status=error count={} error={err}",
                self.items.len()
            );
            StoreError::from(err)
        })
    }
}

/// Decodes a stored collection, dropping records that cannot be trusted.
fn decode_items(raw: &str) -> Vec<Item> {
    let records = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(records)) => records,
        Ok(_) => {
            warn!("event=store_load module=store status=error reason=not_array count=0");
            return Vec::new();
        }
        Err(err) => {
            warn!("event=store_load module=store status=error reason=unparseable count=0 error={err}");
            return Vec::new();
        }
    };

    let total = records.len();
    let mut seen = HashSet::with_capacity(total);
    let mut items = Vec::with_capacity(total);
    for record in records {
        let item = match serde_json::from_value::<Item>(record) {
            Ok(item) => item,
            Err(err) => {
                warn!("event=store_load module=store status=skipped reason=malformed_record error={err}");
                continue;
            }
        };
        if let Err(err) = item.validate() {
            warn!(
                "event=store_load module=store status=skipped reason=invalid_record item_id={} error={err}",
                item.id
            );
            continue;
        }
        if !seen.insert(item.id) {
            warn!(
                "event=store_load module=store status=skipped reason=duplicate_id item_id={}",
                item.id
            );
            continue;
        }
        items.push(item);
    }

    debug!(
        "event=store_load module=store status=ok count={} dropped={}",
        items.len(),
        total - items.len()
    );
    items
}

#[cfg(test)]
mod tests {
    use super::{decode_items, ItemPatch, ItemStore, StoreError};
    use crate::model::item::{Item, ItemValidationError};
    use crate::repo::kv_store::{KeyValueStore, MemoryKeyValueStore, StorageError, StorageResult};
    use chrono::NaiveDate;
    use std::cell::Cell;

    const KEY: &str = "replacementItems";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Memory store whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryKeyValueStore,
        fail_writes: Cell<bool>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            if self.fail_writes.get() {
                return Err(StorageError::Unavailable("quota exceeded".to_string()));
            }
            self.inner.set(key, value)
        }
    }

    #[test]
    fn corrupt_payloads_load_empty() {
        assert!(decode_items("not json").is_empty());
        assert!(decode_items("{\"id\": 1}").is_empty());
        assert!(decode_items("null").is_empty());
    }

    #[test]
    fn decode_drops_invalid_and_duplicate_records() {
        let raw = r#"[
            {"id":"11111111-2222-4333-8444-555555555555","name":"Filter","replacementInterval":30,"lastReplaced":"2024-01-01"},
            {"id":"11111111-2222-4333-8444-555555555555","name":"Copy","replacementInterval":30,"lastReplaced":"2024-01-01"},
            {"id":"21111111-2222-4333-8444-555555555555","name":"Zero","replacementInterval":0,"lastReplaced":"2024-01-01"},
            {"id":"31111111-2222-4333-8444-555555555555","name":"Bad date","replacementInterval":3,"lastReplaced":"yesterday"}
        ]"#;
        let items = decode_items(raw);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Filter");
    }

    #[test]
    fn browser_era_records_are_not_decoded() {
        let raw = r#"[
            {"id":1712345678901,"name":"Old filter","replacementInterval":30,"lastReplaced":"2024-01-01T08:30:00.000Z"},
            {"id":"41111111-2222-4333-8444-555555555555","name":"New filter","replacementInterval":30,"lastReplaced":"2024-01-01"}
        ]"#;
        let items = decode_items(raw);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "New filter");
    }

    #[test]
    fn update_with_invalid_patch_is_rejected_without_change() {
        let mut store = ItemStore::open(MemoryKeyValueStore::new(), KEY).unwrap();
        let item = Item::new("Toothbrush", 90, date(2024, 1, 1)).unwrap();
        let id = store.add(item.clone()).unwrap();

        let err = store
            .update(id, &ItemPatch::default().interval_days(0))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ItemValidationError::ZeroInterval)
        ));
        assert_eq!(store.get(id), Some(&item));
    }

    #[test]
    fn failed_writes_roll_back_every_mutation() {
        let mut store = ItemStore::open(FlakyStore::default(), KEY).unwrap();
        let kept = Item::new("Smoke alarm battery", 180, date(2024, 1, 1)).unwrap();
        let kept_id = store.add(kept.clone()).unwrap();
        store.backend().fail_writes.set(true);

        let extra = Item::new("Air filter", 60, date(2024, 1, 1)).unwrap();
        assert!(matches!(store.add(extra), Err(StoreError::Storage(_))));
        assert_eq!(store.len(), 1);

        let patch = ItemPatch::default().name("Renamed");
        assert!(store.update(kept_id, &patch).is_err());
        assert_eq!(store.get(kept_id), Some(&kept));

        assert!(store.remove(kept_id).is_err());
        assert_eq!(store.list(), std::slice::from_ref(&kept));
    }
}
