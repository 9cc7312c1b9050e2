//! Inventory repository adapter.
//!
//! Two levels of access:
//!
//! - [`InventoryStore`] is the shared handle. It answers read-side queries and
//!   opens sessions.
//! - [`InventorySession`] is one unit of work. Every write made through a
//!   session is visible to later lookups on the same session, and nothing is
//!   visible to anyone else until [`InventorySession::commit`].
//!
//! Name lookups are case-insensitive (see [`despensa_inventory::name_key`])
//! and resolve to the oldest matching row.

use async_trait::async_trait;
use thiserror::Error;

use despensa_core::{DomainError, ItemId, SectionId};
use despensa_inventory::{HistoryRecord, Item, NewItem, NewSection, Section};

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryInventoryStore;
pub use sqlite::SqliteInventoryStore;

/// Repository operation error.
///
/// `Conflict` and `NotFound` concern a single command and leave the session
/// usable. `Storage` means the backend itself failed; the unit of work must be
/// abandoned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("conflicto: {0}")]
    Conflict(String),

    #[error("no encontrado: {0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Storage(_))
    }
}

impl From<DomainError> for StoreError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound(msg) => StoreError::NotFound(msg),
            DomainError::Conflict(msg) => StoreError::Conflict(msg),
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => StoreError::Conflict(msg),
        }
    }
}

/// Page of items, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemQuery {
    pub section_id: Option<SectionId>,
    pub offset: usize,
    pub limit: usize,
}

impl ItemQuery {
    pub fn all() -> Self {
        Self {
            section_id: None,
            offset: 0,
            limit: usize::MAX,
        }
    }

    pub fn page(offset: usize, limit: usize) -> Self {
        Self {
            section_id: None,
            offset,
            limit,
        }
    }

    pub fn in_section(mut self, section_id: SectionId) -> Self {
        self.section_id = Some(section_id);
        self
    }
}

/// One unit of work against the inventory.
///
/// Dropping a session without committing discards its writes.
#[async_trait]
pub trait InventorySession: Send {
    async fn find_item_by_name(&mut self, name: &str) -> Result<Option<Item>, StoreError>;

    async fn find_section_by_name(&mut self, name: &str) -> Result<Option<Section>, StoreError>;

    async fn section(&mut self, id: SectionId) -> Result<Option<Section>, StoreError>;

    /// Insert a section. A name that already exists (case-insensitively) is a
    /// `Conflict`, even if the caller checked beforehand.
    async fn create_section(&mut self, new: NewSection) -> Result<Section, StoreError>;

    async fn create_item(&mut self, new: NewItem) -> Result<Item, StoreError>;

    /// Persist the mutable fields of an already stored item.
    async fn update_item(&mut self, item: &Item) -> Result<(), StoreError>;

    async fn update_section(&mut self, section: &Section) -> Result<(), StoreError>;

    async fn list_items_in_section(
        &mut self,
        section_id: SectionId,
    ) -> Result<Vec<Item>, StoreError>;

    /// Remove an item together with its history.
    async fn delete_item(&mut self, id: ItemId) -> Result<(), StoreError>;

    /// Remove a section. Fails with `Conflict` while it still owns items.
    async fn delete_section(&mut self, id: SectionId) -> Result<(), StoreError>;

    async fn record_history(
        &mut self,
        item_id: ItemId,
        quantity: f64,
    ) -> Result<HistoryRecord, StoreError>;

    /// Make every write of this session durable. The session is finished afterwards.
    async fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard every write of this session. The session is finished afterwards.
    async fn rollback(&mut self) -> Result<(), StoreError>;
}

/// Shared inventory repository.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn InventorySession>, StoreError>;

    /// All sections, ordered by name.
    async fn list_sections(&self) -> Result<Vec<Section>, StoreError>;

    /// Items ordered by `updated_at` descending, ties broken by id descending.
    async fn list_items(&self, query: ItemQuery) -> Result<Vec<Item>, StoreError>;

    async fn item(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    async fn section(&self, id: SectionId) -> Result<Option<Section>, StoreError>;

    /// Most recent history records of an item, newest first.
    async fn item_history(
        &self,
        item_id: ItemId,
        limit: usize,
    ) -> Result<Vec<HistoryRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_errors_are_fatal() {
        assert!(StoreError::Storage("disk".into()).is_fatal());
        assert!(!StoreError::Conflict("dup".into()).is_fatal());
        assert!(!StoreError::NotFound("gone".into()).is_fatal());
    }

    #[test]
    fn domain_errors_map_to_per_command_failures() {
        let err: StoreError = DomainError::validation("item name cannot be empty").into();
        assert!(!err.is_fatal());
        let err: StoreError = DomainError::not_found("item 3").into();
        assert_eq!(err, StoreError::NotFound("item 3".into()));
    }

    #[test]
    fn item_query_builders() {
        let q = ItemQuery::page(5, 5).in_section(SectionId::new(2));
        assert_eq!(q.offset, 5);
        assert_eq!(q.limit, 5);
        assert_eq!(q.section_id, Some(SectionId::new(2)));
        assert_eq!(ItemQuery::all().limit, usize::MAX);
    }
}
