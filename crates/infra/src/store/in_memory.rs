use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use despensa_core::entity::position_of;
use despensa_core::{HistoryId, ItemId, SectionId};
use despensa_inventory::{HistoryRecord, Item, NewItem, NewSection, Section, name_key};

use super::{InventorySession, InventoryStore, ItemQuery, StoreError};

#[derive(Debug, Clone, Default)]
struct State {
    sections: Vec<Section>,
    items: Vec<Item>,
    history: Vec<HistoryRecord>,
    last_section_id: i64,
    last_item_id: i64,
    last_history_id: i64,
}

impl State {
    fn next_section_id(&mut self) -> SectionId {
        self.last_section_id += 1;
        SectionId::new(self.last_section_id)
    }

    fn next_item_id(&mut self) -> ItemId {
        self.last_item_id += 1;
        ItemId::new(self.last_item_id)
    }

    fn next_history_id(&mut self) -> HistoryId {
        self.last_history_id += 1;
        HistoryId::new(self.last_history_id)
    }

    fn find_section(&self, id: SectionId) -> Option<&Section> {
        position_of(&self.sections, id).map(|idx| &self.sections[idx])
    }

    fn find_item(&self, id: ItemId) -> Option<&Item> {
        position_of(&self.items, id).map(|idx| &self.items[idx])
    }
}

/// Failure injection for tests.
#[derive(Debug, Default)]
struct Faults {
    fail_next_commit: bool,
    writes_before_failure: Option<usize>,
}

impl Faults {
    fn check_write(&mut self) -> Result<(), StoreError> {
        match self.writes_before_failure.as_mut() {
            Some(0) => Err(StoreError::Storage("simulated write failure".to_string())),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// In-memory inventory store.
///
/// Intended for tests/dev. A session holds the store lock for its whole
/// lifetime, so batches run one after another. Rollback restores a snapshot
/// taken when the session began.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryStore {
    state: Arc<AsyncMutex<State>>,
    faults: Arc<Mutex<Faults>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit fail with a storage error (the session is rolled back).
    pub fn fail_next_commit(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.fail_next_commit = true;
        }
    }

    /// Let `writes` more session writes succeed, then fail every write with a
    /// storage error until [`Self::clear_faults`].
    pub fn fail_writes_after(&self, writes: usize) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.writes_before_failure = Some(writes);
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            *faults = Faults::default();
        }
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn begin(&self) -> Result<Box<dyn InventorySession>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let snapshot = guard.clone();
        Ok(Box::new(InMemorySession {
            guard,
            snapshot: Some(snapshot),
            faults: self.faults.clone(),
        }))
    }

    async fn list_sections(&self) -> Result<Vec<Section>, StoreError> {
        let state = self.state.lock().await;
        let mut sections = state.sections.clone();
        sections.sort_by_key(Section::key);
        Ok(sections)
    }

    async fn list_items(&self, query: ItemQuery) -> Result<Vec<Item>, StoreError> {
        let state = self.state.lock().await;
        let mut items: Vec<Item> = state
            .items
            .iter()
            .filter(|it| query.section_id.is_none_or(|sid| it.section_id == sid))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(items.into_iter().skip(query.offset).take(query.limit).collect())
    }

    async fn item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.state.lock().await.find_item(id).cloned())
    }

    async fn section(&self, id: SectionId) -> Result<Option<Section>, StoreError> {
        Ok(self.state.lock().await.find_section(id).cloned())
    }

    async fn item_history(
        &self,
        item_id: ItemId,
        limit: usize,
    ) -> Result<Vec<HistoryRecord>, StoreError> {
        let state = self.state.lock().await;
        let mut records: Vec<HistoryRecord> = state
            .history
            .iter()
            .filter(|h| h.item_id == item_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.changed_at.cmp(&a.changed_at).then(b.id.cmp(&a.id)));
        records.truncate(limit);
        Ok(records)
    }
}

/// Session over the locked in-memory state.
///
/// `snapshot` is `None` once the session is finished.
struct InMemorySession {
    guard: OwnedMutexGuard<State>,
    snapshot: Option<State>,
    faults: Arc<Mutex<Faults>>,
}

impl InMemorySession {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.snapshot.is_none() {
            return Err(StoreError::Storage("session already finished".to_string()));
        }
        Ok(())
    }

    fn before_write(&self) -> Result<(), StoreError> {
        self.ensure_open()?;
        let mut faults = self
            .faults
            .lock()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        faults.check_write()
    }

    fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

impl Drop for InMemorySession {
    fn drop(&mut self) {
        self.restore();
    }
}

#[async_trait]
impl InventorySession for InMemorySession {
    async fn find_item_by_name(&mut self, name: &str) -> Result<Option<Item>, StoreError> {
        self.ensure_open()?;
        let key = name_key(name);
        Ok(self.guard.items.iter().find(|it| it.key() == key).cloned())
    }

    async fn find_section_by_name(&mut self, name: &str) -> Result<Option<Section>, StoreError> {
        self.ensure_open()?;
        let key = name_key(name);
        Ok(self.guard.sections.iter().find(|s| s.key() == key).cloned())
    }

    async fn section(&mut self, id: SectionId) -> Result<Option<Section>, StoreError> {
        self.ensure_open()?;
        Ok(self.guard.find_section(id).cloned())
    }

    async fn create_section(&mut self, new: NewSection) -> Result<Section, StoreError> {
        self.before_write()?;
        let key = new.key();
        if self.guard.sections.iter().any(|s| s.key() == key) {
            return Err(StoreError::Conflict(format!("section '{}' already exists", new.name)));
        }

        let section = Section {
            id: self.guard.next_section_id(),
            name: new.name,
            emoji: new.emoji,
            created_at: Utc::now(),
        };
        self.guard.sections.push(section.clone());
        Ok(section)
    }

    async fn create_item(&mut self, new: NewItem) -> Result<Item, StoreError> {
        self.before_write()?;
        new.validate()?;
        if self.guard.find_section(new.section_id).is_none() {
            return Err(StoreError::NotFound(format!("section {}", new.section_id)));
        }

        let item = Item {
            id: self.guard.next_item_id(),
            name: new.name.trim().to_string(),
            emoji: new.emoji,
            quantity: new.quantity,
            unit: new.unit,
            threshold: new.threshold,
            section_id: new.section_id,
            updated_at: Utc::now(),
        };
        self.guard.items.push(item.clone());
        Ok(item)
    }

    async fn update_item(&mut self, item: &Item) -> Result<(), StoreError> {
        self.before_write()?;
        if self.guard.find_section(item.section_id).is_none() {
            return Err(StoreError::NotFound(format!("section {}", item.section_id)));
        }
        let idx = position_of(&self.guard.items, item.id)
            .ok_or_else(|| StoreError::NotFound(format!("item {}", item.id)))?;
        self.guard.items[idx] = item.clone();
        Ok(())
    }

    async fn update_section(&mut self, section: &Section) -> Result<(), StoreError> {
        self.before_write()?;
        let key = section.key();
        if self
            .guard
            .sections
            .iter()
            .any(|s| s.id != section.id && s.key() == key)
        {
            return Err(StoreError::Conflict(format!("section '{}' already exists", section.name)));
        }
        let idx = position_of(&self.guard.sections, section.id)
            .ok_or_else(|| StoreError::NotFound(format!("section {}", section.id)))?;
        self.guard.sections[idx] = section.clone();
        Ok(())
    }

    async fn list_items_in_section(
        &mut self,
        section_id: SectionId,
    ) -> Result<Vec<Item>, StoreError> {
        self.ensure_open()?;
        Ok(self
            .guard
            .items
            .iter()
            .filter(|it| it.section_id == section_id)
            .cloned()
            .collect())
    }

    async fn delete_item(&mut self, id: ItemId) -> Result<(), StoreError> {
        self.before_write()?;
        let idx = position_of(&self.guard.items, id)
            .ok_or_else(|| StoreError::NotFound(format!("item {id}")))?;
        self.guard.items.remove(idx);
        self.guard.history.retain(|h| h.item_id != id);
        Ok(())
    }

    async fn delete_section(&mut self, id: SectionId) -> Result<(), StoreError> {
        self.before_write()?;
        if self.guard.items.iter().any(|it| it.section_id == id) {
            return Err(StoreError::Conflict(format!("section {id} still owns items")));
        }
        let idx = position_of(&self.guard.sections, id)
            .ok_or_else(|| StoreError::NotFound(format!("section {id}")))?;
        self.guard.sections.remove(idx);
        Ok(())
    }

    async fn record_history(
        &mut self,
        item_id: ItemId,
        quantity: f64,
    ) -> Result<HistoryRecord, StoreError> {
        self.before_write()?;
        if self.guard.find_item(item_id).is_none() {
            return Err(StoreError::NotFound(format!("item {item_id}")));
        }

        let record = HistoryRecord {
            id: self.guard.next_history_id(),
            item_id,
            quantity,
            changed_at: Utc::now(),
        };
        self.guard.history.push(record.clone());
        Ok(record)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        let fail = self
            .faults
            .lock()
            .map(|mut f| std::mem::take(&mut f.fail_next_commit))
            .unwrap_or(false);
        if fail {
            self.restore();
            return Err(StoreError::Storage("simulated commit failure".to_string()));
        }

        self.snapshot = None;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.restore();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use despensa_inventory::item::{DEFAULT_ITEM_EMOJI, DEFAULT_THRESHOLD, DEFAULT_UNIT};

    fn new_item(name: &str, quantity: f64, section_id: SectionId) -> NewItem {
        NewItem {
            name: name.to_string(),
            emoji: DEFAULT_ITEM_EMOJI.to_string(),
            quantity,
            unit: DEFAULT_UNIT.to_string(),
            threshold: DEFAULT_THRESHOLD,
            section_id,
        }
    }

    #[tokio::test]
    async fn writes_are_visible_within_the_session() {
        let store = InMemoryInventoryStore::new();
        let mut session = store.begin().await.unwrap();

        let section = session
            .create_section(NewSection::new("refrigerador", Some("🧊")))
            .await
            .unwrap();
        session.create_item(new_item("Leche", 2.0, section.id)).await.unwrap();

        let found = session.find_item_by_name("LECHE").await.unwrap().unwrap();
        assert_eq!(found.section_id, section.id);
        let found = session.find_section_by_name("REFRIGERADOR").await.unwrap().unwrap();
        assert_eq!(found.name, "Refrigerador");

        session.commit().await.unwrap();
        assert_eq!(store.list_sections().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dropping_a_session_discards_its_writes() {
        let store = InMemoryInventoryStore::new();
        {
            let mut session = store.begin().await.unwrap();
            session.create_section(NewSection::new("congelador", None)).await.unwrap();
        }
        assert!(store.list_sections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_section_names_conflict() {
        let store = InMemoryInventoryStore::new();
        let mut session = store.begin().await.unwrap();
        session.create_section(NewSection::new("Despensa", None)).await.unwrap();

        let err = session
            .create_section(NewSection::new("DESPENSA", None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn section_with_items_cannot_be_deleted() {
        let store = InMemoryInventoryStore::new();
        let mut session = store.begin().await.unwrap();
        let section = session.create_section(NewSection::new("a", None)).await.unwrap();
        session.create_item(new_item("pan", 1.0, section.id)).await.unwrap();

        let err = session.delete_section(section.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_an_item_drops_its_history() {
        let store = InMemoryInventoryStore::new();
        let mut session = store.begin().await.unwrap();
        let section = session.create_section(NewSection::new("a", None)).await.unwrap();
        let item = session.create_item(new_item("pan", 1.0, section.id)).await.unwrap();
        session.record_history(item.id, 1.0).await.unwrap();
        session.delete_item(item.id).await.unwrap();
        session.commit().await.unwrap();

        assert!(store.item_history(item.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_commit_restores_the_snapshot() {
        let store = InMemoryInventoryStore::new();
        store.fail_next_commit();

        let mut session = store.begin().await.unwrap();
        session.create_section(NewSection::new("a", None)).await.unwrap();
        let err = session.commit().await.unwrap_err();
        assert!(err.is_fatal());
        drop(session);

        assert!(store.list_sections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_budget_turns_into_storage_errors() {
        let store = InMemoryInventoryStore::new();
        store.fail_writes_after(1);

        let mut session = store.begin().await.unwrap();
        session.create_section(NewSection::new("a", None)).await.unwrap();
        let err = session.create_section(NewSection::new("b", None)).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn items_page_newest_first() {
        let store = InMemoryInventoryStore::new();
        let mut session = store.begin().await.unwrap();
        let section = session.create_section(NewSection::new("a", None)).await.unwrap();
        for name in ["uno", "dos", "tres"] {
            session.create_item(new_item(name, 1.0, section.id)).await.unwrap();
        }
        session.commit().await.unwrap();

        let page = store.list_items(ItemQuery::page(0, 2)).await.unwrap();
        let names: Vec<&str> = page.iter().map(|it| it.name.as_str()).collect();
        assert_eq!(names, vec!["tres", "dos"]);

        let rest = store.list_items(ItemQuery::page(2, 2)).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].name, "uno");
    }
}
