//! Interaction controller for the replacement tracker.
//!
//! # Responsibility
//! - Turn user actions (add, replace, rename, delete, edit dates, relabel)
//!   into validated store mutations.
//! - Own per-item editing contexts (rename drafts, date drafts) and the
//!   pending delete request.
//!
//! # Invariants
//! - A rejected action never mutates the store.
//! - Deletion happens only through `confirm_delete` after `request_delete`.
//! - Draft edits reach the store only on commit; cancel discards them.
//! - Category/verb values stored on items are canonical catalog labels.

use crate::clock::Clock;
use crate::config::{ConfigError, LabelKind, TrackerConfig};
use crate::model::item::{Item, ItemId, ItemValidationError};
use crate::reconcile::{DateEditDraft, DateEditError};
use crate::repo::kv_store::KeyValueStore;
use crate::store::{ItemPatch, ItemStore, StoreError};
use crate::view::{build_rows, CategoryFilter, ItemRow};
use log::info;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Rejected or failed controller action.
#[derive(Debug)]
pub enum TrackerError {
    /// Name is empty or whitespace-only.
    BlankName,
    /// Interval must be at least one day.
    ZeroInterval,
    /// Label is not part of the configured catalog.
    UnknownLabel { kind: LabelKind, label: String },
    ItemNotFound(ItemId),
    /// `confirm_delete` called without a pending request.
    NoPendingDelete,
    /// No rename draft is open for the item.
    NoRenameDraft(ItemId),
    /// No date editor is open for the item.
    NoDateEdit(ItemId),
    DateEdit(DateEditError),
    Store(StoreError),
    Config(ConfigError),
}

impl Display for TrackerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "item name must not be blank"),
            Self::ZeroInterval => write!(f, "replacement interval must be at least 1 day"),
            Self::UnknownLabel { kind, label } => write!(f, "unknown {kind} `{label}`"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::NoPendingDelete => write!(f, "no delete request is pending"),
            Self::NoRenameDraft(id) => write!(f, "no rename in progress for item {id}"),
            Self::NoDateEdit(id) => write!(f, "no date edit in progress for item {id}"),
            Self::DateEdit(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TrackerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DateEdit(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for TrackerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => err.into(),
            other => Self::Store(other),
        }
    }
}

impl From<ItemValidationError> for TrackerError {
    fn from(value: ItemValidationError) -> Self {
        match value {
            ItemValidationError::BlankName => Self::BlankName,
            ItemValidationError::ZeroInterval => Self::ZeroInterval,
            other => Self::Store(StoreError::Validation(other)),
        }
    }
}

impl From<ConfigError> for TrackerError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DateEditError> for TrackerError {
    fn from(value: DateEditError) -> Self {
        Self::DateEdit(value)
    }
}

/// Add-form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddItemRequest {
    pub name: String,
    /// Falls back to `TrackerConfig::default_interval_days` when `None`.
    pub interval_days: Option<u32>,
    pub category: Option<String>,
    pub verb: Option<String>,
}

impl AddItemRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn interval_days(mut self, interval_days: u32) -> Self {
        self.interval_days = Some(interval_days);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn verb(mut self, verb: impl Into<String>) -> Self {
        self.verb = Some(verb.into());
        self
    }
}

/// Inline rename context for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameDraft {
    original: String,
    draft: String,
}

impl RenameDraft {
    /// Name the item had when editing started.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }
}

/// Controller over one item store, clock, and configuration.
pub struct TrackerService<K: KeyValueStore, C: Clock> {
    store: ItemStore<K>,
    clock: C,
    config: TrackerConfig,
    pending_delete: Option<ItemId>,
    renames: HashMap<ItemId, RenameDraft>,
    date_edits: HashMap<ItemId, DateEditDraft>,
}

impl<K: KeyValueStore, C: Clock> TrackerService<K, C> {
    /// Loads the collection under `config.storage_key` from `backend`.
    ///
    /// # Errors
    /// - `Config` when `config` fails `TrackerConfig::validate`.
    pub fn open(backend: K, clock: C, config: TrackerConfig) -> TrackerResult<Self> {
        config.validate()?;
        let store = ItemStore::open(backend, config.storage_key.clone())?;
        info!(
            "event=tracker_open module=service status=ok count={}",
            store.len()
        );
        Ok(Self {
            store,
            clock,
            config,
            pending_delete: None,
            renames: HashMap::new(),
            date_edits: HashMap::new(),
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &ItemStore<K> {
        &self.store
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[Item] {
        self.store.list()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.store.get(id)
    }

    /// Display rows for today, most urgent first.
    pub fn rows(&self, filter: &CategoryFilter) -> Vec<ItemRow<'_>> {
        build_rows(self.store.list(), self.clock.today(), filter)
    }

    /// Adds an item serviced today.
    pub fn add_item(&mut self, request: AddItemRequest) -> TrackerResult<ItemId> {
        let name = request.name.trim();
        if name.is_empty() {
            info!("event=item_add module=service status=rejected reason=blank_name");
            return Err(TrackerError::BlankName);
        }
        let interval_days = request
            .interval_days
            .unwrap_or(self.config.default_interval_days);
        if interval_days == 0 {
            info!("event=item_add module=service status=rejected reason=zero_interval");
            return Err(TrackerError::ZeroInterval);
        }
        let category = self.resolve_label(LabelKind::Category, request.category.as_deref())?;
        let verb = self.resolve_label(LabelKind::Verb, request.verb.as_deref())?;

        let mut item = Item::new(name, interval_days, self.clock.today())?;
        item.category = category;
        item.verb = verb;
        let id = self.store.add(item)?;

        info!("event=item_add module=service status=ok item_id={id} interval_days={interval_days}");
        Ok(id)
    }

    /// Marks the item as serviced today; the interval is unchanged.
    pub fn replace_now(&mut self, id: ItemId) -> TrackerResult<()> {
        self.require(id)?;
        let today = self.clock.today();
        self.store
            .update(id, &ItemPatch::default().last_replaced(today))?;
        info!("event=item_replace module=service status=ok item_id={id} date={today}");
        Ok(())
    }

    /// Records a delete request; nothing is removed until confirmed.
    ///
    /// A newer request replaces any older pending one.
    pub fn request_delete(&mut self, id: ItemId) -> TrackerResult<()> {
        self.require(id)?;
        self.pending_delete = Some(id);
        info!("event=item_delete module=service status=pending item_id={id}");
        Ok(())
    }

    pub fn pending_delete(&self) -> Option<ItemId> {
        self.pending_delete
    }

    /// Removes the item named by the pending delete request.
    pub fn confirm_delete(&mut self) -> TrackerResult<ItemId> {
        let id = self.pending_delete.ok_or(TrackerError::NoPendingDelete)?;
        if !self.store.remove(id)? {
            self.pending_delete = None;
            return Err(TrackerError::ItemNotFound(id));
        }
        self.pending_delete = None;
        self.renames.remove(&id);
        self.date_edits.remove(&id);
        info!("event=item_delete module=service status=ok item_id={id}");
        Ok(id)
    }

    /// Drops the pending delete request, returning the id it named.
    pub fn cancel_delete(&mut self) -> Option<ItemId> {
        let cancelled = self.pending_delete.take();
        if let Some(id) = cancelled {
            info!("event=item_delete module=service status=cancelled item_id={id}");
        }
        cancelled
    }

    /// One-shot rename.
    pub fn rename(&mut self, id: ItemId, name: &str) -> TrackerResult<()> {
        self.require(id)?;
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TrackerError::BlankName);
        }
        self.store.update(id, &ItemPatch::default().name(trimmed))?;
        info!("event=item_rename module=service status=ok item_id={id}");
        Ok(())
    }

    /// Opens an inline rename draft seeded with the current name.
    pub fn begin_rename(&mut self, id: ItemId) -> TrackerResult<&RenameDraft> {
        let current = self.require(id)?.name.clone();
        let draft = RenameDraft {
            original: current.clone(),
            draft: current,
        };
        self.renames.insert(id, draft);
        Ok(&self.renames[&id])
    }

    pub fn rename_draft(&self, id: ItemId) -> Option<&RenameDraft> {
        self.renames.get(&id)
    }

    pub fn set_rename_draft(&mut self, id: ItemId, text: impl Into<String>) -> TrackerResult<()> {
        let draft = self
            .renames
            .get_mut(&id)
            .ok_or(TrackerError::NoRenameDraft(id))?;
        draft.draft = text.into();
        Ok(())
    }

    /// Applies the draft and closes it.
    ///
    /// A blank draft is rejected, closed, and the prior name stays in place.
    /// On a failed write the draft stays open so the text is not lost.
    pub fn commit_rename(&mut self, id: ItemId) -> TrackerResult<()> {
        let text = self
            .renames
            .get(&id)
            .ok_or(TrackerError::NoRenameDraft(id))?
            .draft
            .clone();
        match self.rename(id, &text) {
            Ok(()) => {
                self.renames.remove(&id);
                Ok(())
            }
            Err(TrackerError::BlankName) => {
                self.renames.remove(&id);
                Err(TrackerError::BlankName)
            }
            Err(err) => Err(err),
        }
    }

    /// Closes the draft, returning the restored original name.
    pub fn cancel_rename(&mut self, id: ItemId) -> Option<String> {
        self.renames.remove(&id).map(|draft| draft.original)
    }

    /// Opens a date editor seeded from the stored last date and interval.
    ///
    /// Reopening discards any previous pending edits for the item.
    pub fn begin_date_edit(&mut self, id: ItemId) -> TrackerResult<DateEditDraft> {
        let item = self.require(id)?;
        let draft = DateEditDraft::new(item.last_replaced, item.interval_days)?;
        self.date_edits.insert(id, draft);
        Ok(draft)
    }

    pub fn date_edit(&self, id: ItemId) -> Option<&DateEditDraft> {
        self.date_edits.get(&id)
    }

    /// Edits the draft's last date from field text; the interval holds.
    pub fn edit_last_replaced(&mut self, id: ItemId, input: &str) -> TrackerResult<DateEditDraft> {
        let draft = self.date_draft_mut(id)?;
        draft.edit_last_replaced(input)?;
        Ok(*draft)
    }

    /// Edits the draft's next date from field text; the interval follows.
    pub fn edit_next_date(&mut self, id: ItemId, input: &str) -> TrackerResult<DateEditDraft> {
        let draft = self.date_draft_mut(id)?;
        draft.edit_next_date(input)?;
        Ok(*draft)
    }

    pub fn edit_interval(
        &mut self,
        id: ItemId,
        interval_days: u32,
    ) -> TrackerResult<DateEditDraft> {
        let draft = self.date_draft_mut(id)?;
        draft.set_interval(interval_days)?;
        Ok(*draft)
    }

    /// Writes the draft's last date and interval, closing the editor.
    pub fn commit_date_edit(&mut self, id: ItemId) -> TrackerResult<()> {
        let draft = *self
            .date_edits
            .get(&id)
            .ok_or(TrackerError::NoDateEdit(id))?;
        let patch = ItemPatch::default()
            .last_replaced(draft.last_replaced())
            .interval_days(draft.interval_days());
        let updated = self.store.update(id, &patch)?;
        self.date_edits.remove(&id);
        if !updated {
            return Err(TrackerError::ItemNotFound(id));
        }
        info!(
            "event=item_edit_dates module=service status=ok item_id={id} last_replaced={} interval_days={}",
            draft.last_replaced(),
            draft.interval_days()
        );
        Ok(())
    }

    /// Discards the item's date editor; returns whether one was open.
    pub fn cancel_date_edit(&mut self, id: ItemId) -> bool {
        self.date_edits.remove(&id).is_some()
    }

    /// Sets or clears the verb label.
    pub fn set_verb(&mut self, id: ItemId, verb: Option<&str>) -> TrackerResult<()> {
        self.require(id)?;
        let verb = self.resolve_label(LabelKind::Verb, verb)?;
        self.store.update(id, &ItemPatch::default().verb(verb))?;
        Ok(())
    }

    /// Sets or clears the category label.
    pub fn set_category(&mut self, id: ItemId, category: Option<&str>) -> TrackerResult<()> {
        self.require(id)?;
        let category = self.resolve_label(LabelKind::Category, category)?;
        self.store
            .update(id, &ItemPatch::default().category(category))?;
        Ok(())
    }

    fn require(&self, id: ItemId) -> TrackerResult<&Item> {
        self.store.get(id).ok_or(TrackerError::ItemNotFound(id))
    }

    fn date_draft_mut(&mut self, id: ItemId) -> TrackerResult<&mut DateEditDraft> {
        self.date_edits
            .get_mut(&id)
            .ok_or(TrackerError::NoDateEdit(id))
    }

    /// Maps optional input to a canonical label; blank input clears it.
    fn resolve_label(
        &self,
        kind: LabelKind,
        input: Option<&str>,
    ) -> TrackerResult<Option<String>> {
        let Some(raw) = input.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(None);
        };
        self.config
            .catalog
            .resolve(kind, raw)
            .map(|label| Some(label.to_string()))
            .ok_or_else(|| TrackerError::UnknownLabel {
                kind,
                label: raw.to_string(),
            })
    }
}
