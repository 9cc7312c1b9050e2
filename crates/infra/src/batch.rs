//! Batch executor.
//!
//! Runs the interpreter over every command of one batch, in order, inside a
//! single store session:
//!
//! ```text
//! begin session
//!   ↓
//! for each command: interpret → change line | error line | ignored
//!   ↓                (storage failure → rollback, BatchError)
//! commit             (failure → BatchError, nothing persisted)
//!   ↓
//! publish InventoryEvent::Changed   (only when something changed)
//! ```
//!
//! A failing command adds one line to `errors` and the batch moves on. Only a
//! storage-level failure aborts it.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use despensa_ai::RawCommand;
use despensa_events::{EventBus, InventoryEvent};

use crate::interpreter::{CommandInterpreter, Outcome};
use crate::store::{InventorySession, InventoryStore, StoreError};

/// What happened to one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub changes: Vec<String>,
    pub errors: Vec<String>,
    /// Actions that were skipped because they are not supported.
    pub ignored: Vec<String>,
}

impl BatchReport {
    pub fn new(batch_id: Uuid) -> Self {
        Self {
            batch_id,
            changes: Vec::new(),
            errors: Vec::new(),
            ignored: Vec::new(),
        }
    }

    pub fn did_change(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// The batch could not be stored. Nothing of it was persisted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for BatchError {
    fn from(value: StoreError) -> Self {
        BatchError::Storage(value.to_string())
    }
}

pub struct BatchExecutor<B> {
    store: Arc<dyn InventoryStore>,
    bus: B,
    interpreter: CommandInterpreter,
}

impl<B> BatchExecutor<B> {
    pub fn new(store: Arc<dyn InventoryStore>, bus: B) -> Self {
        Self::with_interpreter(store, bus, CommandInterpreter::default())
    }

    pub fn with_interpreter(
        store: Arc<dyn InventoryStore>,
        bus: B,
        interpreter: CommandInterpreter,
    ) -> Self {
        Self {
            store,
            bus,
            interpreter,
        }
    }
}

impl<B> BatchExecutor<B>
where
    B: EventBus<InventoryEvent>,
{
    /// Execute `commands` as one batch.
    pub async fn execute(&self, commands: &[RawCommand]) -> Result<BatchReport, BatchError> {
        let batch_id = Uuid::now_v7();
        let span = tracing::info_span!("batch", %batch_id, commands = commands.len());
        self.run(batch_id, commands).instrument(span).await
    }

    async fn run(
        &self,
        batch_id: Uuid,
        commands: &[RawCommand],
    ) -> Result<BatchReport, BatchError> {
        let mut session = self.store.begin().await.map_err(|err| {
            tracing::error!(error = %err, "failed to open store session");
            BatchError::from(err)
        })?;

        let mut report = BatchReport::new(batch_id);

        for (index, raw) in commands.iter().enumerate() {
            match self.interpreter.apply_raw(session.as_mut(), raw).await {
                Ok(Outcome::Changed(text)) => report.changes.push(text),
                Ok(Outcome::Ignored { action }) => {
                    tracing::debug!(index, %action, "ignoring unsupported action");
                    report.ignored.push(action);
                }
                Err(err) if err.is_fatal() => {
                    tracing::error!(index, error = %err, "storage failure; rolling back batch");
                    abandon(session.as_mut()).await;
                    return Err(BatchError::Storage(err.to_string()));
                }
                Err(err) => {
                    tracing::warn!(index, action = raw.action(), error = %err, "command failed");
                    report.errors.push(format!("Error en comando {raw}: {err}"));
                }
            }
        }

        if let Err(err) = session.commit().await {
            tracing::error!(error = %err, "commit failed; batch discarded");
            abandon(session.as_mut()).await;
            return Err(err.into());
        }

        tracing::info!(
            changes = report.changes.len(),
            errors = report.errors.len(),
            ignored = report.ignored.len(),
            "batch committed"
        );

        if report.did_change() {
            let event = InventoryEvent::Changed {
                batch_id,
                change_count: report.changes.len(),
                occurred_at: Utc::now(),
            };
            // Data is already committed; a lost notification only delays cache refreshes.
            if let Err(err) = self.bus.publish(event) {
                tracing::warn!(error = ?err, "failed to publish inventory change");
            }
        }

        Ok(report)
    }
}

/// Roll back a session that is being abandoned. A session that already
/// finished (e.g. after a failed commit) reports an error, which is fine.
async fn abandon(session: &mut dyn InventorySession) {
    if let Err(err) = session.rollback().await {
        tracing::debug!(error = %err, "rollback after failure");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryInventoryStore, ItemQuery};
    use despensa_ai::extract;
    use despensa_events::InMemoryEventBus;

    type Bus = Arc<InMemoryEventBus<InventoryEvent>>;

    fn setup() -> (InMemoryInventoryStore, Bus, BatchExecutor<Bus>) {
        let store = InMemoryInventoryStore::new();
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let executor = BatchExecutor::new(Arc::new(store.clone()), bus.clone());
        (store, bus, executor)
    }

    async fn history_of(store: &InMemoryInventoryStore, name: &str) -> Vec<f64> {
        let items = store.list_items(ItemQuery::all()).await.unwrap();
        let item = items.iter().find(|it| it.name == name).expect("item exists");
        let mut quantities: Vec<f64> = store
            .item_history(item.id, 100)
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.quantity)
            .collect();
        quantities.reverse();
        quantities
    }

    #[tokio::test]
    async fn valid_invalid_valid_keeps_both_valid_effects() {
        let (store, _bus, executor) = setup();
        let commands = extract(
            r#"[
                {"action": "create_item", "item": "leche", "quantity": 1},
                {"action": "add", "item": "pan", "quantity": 1},
                {"action": "create_item", "item": "huevos", "quantity": 12}
            ]"#,
        );

        let report = executor.execute(&commands).await.unwrap();

        assert_eq!(report.changes.len(), 2);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("Error en comando "));
        assert!(report.errors[0].contains(r#""item":"pan""#));
        assert!(report.errors[0].contains("no existe"));
        assert_eq!(store.list_items(ItemQuery::all()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn set_twice_records_two_identical_snapshots() {
        let (store, _bus, executor) = setup();
        executor
            .execute(&extract(r#"[{"action": "create_item", "item": "arroz", "quantity": 0}]"#))
            .await
            .unwrap();

        let report = executor
            .execute(&extract(
                r#"[{"action": "set", "item": "arroz", "quantity": 3},
                    {"action": "set", "item": "arroz", "quantity": 3}]"#,
            ))
            .await
            .unwrap();

        assert_eq!(report.changes.len(), 2);
        assert_eq!(history_of(&store, "arroz").await, vec![0.0, 3.0, 3.0]);
    }

    #[tokio::test]
    async fn adds_accumulate_with_running_totals() {
        let (store, _bus, executor) = setup();
        let report = executor
            .execute(&extract(
                r#"[
                    {"action": "create_item", "item": "leche", "quantity": 1},
                    {"action": "add", "item": "leche", "quantity": 2},
                    {"action": "add", "item": "LECHE", "quantity": 0.5}
                ]"#,
            ))
            .await
            .unwrap();

        assert!(report.errors.is_empty());
        assert_eq!(history_of(&store, "leche").await, vec![1.0, 3.0, 3.5]);
    }

    #[tokio::test]
    async fn later_commands_see_earlier_writes() {
        let (store, _bus, executor) = setup();
        let report = executor
            .execute(&extract(
                r#"[
                    {"action": "create_section", "section": "congelador", "emoji": "❄️"},
                    {"action": "create_item", "item": "helado", "section": "Congelador"},
                    {"action": "move_item", "item": "helado", "section": "almacén 1"}
                ]"#,
            ))
            .await
            .unwrap();

        // almacén 1 does not exist yet: the move fails, the rest stands.
        assert_eq!(report.changes.len(), 2);
        assert_eq!(report.errors.len(), 1);
        let sections = store.list_sections().await.unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "Congelador");
    }

    #[tokio::test]
    async fn storage_failure_mid_batch_rolls_everything_back() {
        let (store, bus, executor) = setup();
        let sub = bus.subscribe();
        store.fail_writes_after(2);

        let err = executor
            .execute(&extract(
                r#"[
                    {"action": "create_section", "section": "a"},
                    {"action": "create_section", "section": "b"},
                    {"action": "create_section", "section": "c"}
                ]"#,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, BatchError::Storage(_)));
        store.clear_faults();
        assert!(store.list_sections().await.unwrap().is_empty());
        assert!(sub.try_recv().is_err());
    }

    #[tokio::test]
    async fn commit_failure_is_fatal_and_silent() {
        let (store, bus, executor) = setup();
        let sub = bus.subscribe();
        store.fail_next_commit();

        let err = executor
            .execute(&extract(r#"[{"action": "create_section", "section": "a"}]"#))
            .await
            .unwrap_err();

        assert!(matches!(err, BatchError::Storage(_)));
        assert!(store.list_sections().await.unwrap().is_empty());
        assert!(sub.try_recv().is_err());
    }

    #[tokio::test]
    async fn notification_fires_only_when_something_changed() {
        let (_store, bus, executor) = setup();
        let sub = bus.subscribe();

        let report = executor
            .execute(&extract(r#"[{"action": "add", "item": "nada", "quantity": 1}]"#))
            .await
            .unwrap();
        assert!(!report.did_change());
        assert!(sub.try_recv().is_err());

        let empty = executor.execute(&[]).await.unwrap();
        assert!(empty.changes.is_empty() && empty.errors.is_empty());
        assert!(sub.try_recv().is_err());

        let report = executor
            .execute(&extract(r#"[{"action": "create_section", "section": "despensa"}]"#))
            .await
            .unwrap();
        match sub.try_recv().unwrap() {
            InventoryEvent::Changed {
                batch_id,
                change_count,
                ..
            } => {
                assert_eq!(batch_id, report.batch_id);
                assert_eq!(change_count, 1);
            }
        }
    }

    // Unsupported actions stay silent: no change, no error line.
    #[tokio::test]
    async fn unsupported_actions_are_reported_as_ignored_only() {
        let (_store, bus, executor) = setup();
        let sub = bus.subscribe();

        let report = executor
            .execute(&extract(r#"[{"action": "teleport", "item": "leche"}]"#))
            .await
            .unwrap();

        assert!(report.changes.is_empty());
        assert!(report.errors.is_empty());
        assert_eq!(report.ignored, vec!["teleport".to_string()]);
        assert!(sub.try_recv().is_err());
    }
}
