//! Service wiring: store, model, bus, processor and the cached section list.

use std::sync::{Arc, RwLock};

use thiserror::Error;

use despensa_ai::{AiError, CommandExtractor, LanguageModel, OpenRouterClient};
use despensa_events::{Event, EventBus, InMemoryEventBus, InventoryEvent};
use despensa_infra::{
    BatchError, BatchExecutor, BatchReport, InMemoryInventoryStore, InventorySnapshot,
    InventoryStore, ProcessError, SqliteInventoryStore, StoreError, VoiceProcessor,
    seed_default_sections,
};
use despensa_inventory::Section;

use crate::config::AppConfig;

pub type Bus = Arc<InMemoryEventBus<InventoryEvent>>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Model(#[from] AiError),
}

/// Section list cache, dropped whenever a batch changes the inventory.
///
/// Every invalidation bumps a generation counter. A list loaded before an
/// invalidation is discarded by [`SectionCache::put`] instead of being cached.
#[derive(Debug, Clone, Default)]
pub struct SectionCache {
    inner: Arc<RwLock<CachedSections>>,
}

#[derive(Debug, Default)]
struct CachedSections {
    generation: u64,
    sections: Option<Vec<Section>>,
}

impl SectionCache {
    pub fn get(&self) -> Option<Vec<Section>> {
        self.inner.read().ok()?.sections.clone()
    }

    /// Generation to pass to [`SectionCache::put`]; read it before loading.
    pub fn generation(&self) -> u64 {
        self.inner.read().map(|c| c.generation).unwrap_or_default()
    }

    /// Cache `sections` loaded at `generation`. Returns false when an
    /// invalidation happened since, leaving the cache empty.
    pub fn put(&self, generation: u64, sections: Vec<Section>) -> bool {
        match self.inner.write() {
            Ok(mut cache) if cache.generation == generation => {
                cache.sections = Some(sections);
                true
            }
            _ => false,
        }
    }

    pub fn invalidate(&self) {
        if let Ok(mut cache) = self.inner.write() {
            cache.generation = cache.generation.wrapping_add(1);
            cache.sections = None;
        }
    }
}

pub struct AppServices {
    pub store: Arc<dyn InventoryStore>,
    pub processor: VoiceProcessor<Bus>,
    pub bus: Bus,
    pub sections: SectionCache,
    pub items_per_page: usize,
    pub history_records_per_item: usize,
}

impl AppServices {
    /// Wire the production services described by `config`.
    pub async fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let store: Arc<dyn InventoryStore> = match &config.database_url {
            Some(url) => {
                tracing::info!(%url, "using sqlite inventory store");
                Arc::new(SqliteInventoryStore::connect(url).await?)
            }
            None => Arc::new(InMemoryInventoryStore::new()),
        };
        let model = Arc::new(OpenRouterClient::new(config.model.clone())?);
        Ok(Self::with_parts(store, model, config).await?)
    }

    /// Wire services around an existing store and model. Seeds the default
    /// sections and starts the cache invalidation listener.
    pub async fn with_parts(
        store: Arc<dyn InventoryStore>,
        model: Arc<dyn LanguageModel>,
        config: &AppConfig,
    ) -> Result<Self, StoreError> {
        seed_default_sections(store.as_ref()).await?;

        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let sections = SectionCache::default();
        spawn_cache_invalidator(&bus, sections.clone());

        let executor = BatchExecutor::new(store.clone(), bus.clone());
        let processor = VoiceProcessor::new(
            model,
            CommandExtractor::new(config.max_model_response_bytes),
            executor,
        );

        Ok(Self {
            store,
            processor,
            bus,
            sections,
            items_per_page: config.items_per_page,
            history_records_per_item: config.history_records_per_item,
        })
    }

    /// Sections ordered by name, served from the cache when it is warm.
    pub async fn sections(&self) -> Result<Vec<Section>, StoreError> {
        if let Some(sections) = self.sections.get() {
            return Ok(sections);
        }
        let generation = self.sections.generation();
        let sections = self.store.list_sections().await?;
        self.sections.put(generation, sections.clone());
        Ok(sections)
    }

    /// Dictated text through the model into the inventory. The section cache
    /// is dropped before returning when anything changed.
    pub async fn process_text(&self, text: &str) -> Result<BatchReport, ProcessError> {
        let hint = self.context_hint().await;
        let report = self.processor.process(text, hint.as_deref()).await?;
        self.after_batch(&report);
        Ok(report)
    }

    /// Raw model output into the inventory, skipping the model.
    pub async fn execute_raw(&self, raw: &str) -> Result<BatchReport, BatchError> {
        let report = self.processor.execute_raw(raw).await?;
        self.after_batch(&report);
        Ok(report)
    }

    fn after_batch(&self, report: &BatchReport) {
        if report.did_change() {
            self.sections.invalidate();
        }
    }

    /// Names known to the inventory, for the model prompt. Advisory: failures
    /// only cost the hint.
    pub async fn context_hint(&self) -> Option<String> {
        match InventorySnapshot::load(self.store.as_ref()).await {
            Ok(snapshot) => snapshot.render(),
            Err(err) => {
                tracing::warn!(error = %err, "could not load inventory snapshot");
                None
            }
        }
    }
}

/// Drop the cached sections on every change notification, including batches
/// run by executors other than this service's processor.
///
/// The thread exits once every handle to the bus is gone.
fn spawn_cache_invalidator(bus: &Bus, cache: SectionCache) {
    let sub = bus.subscribe();
    std::thread::spawn(move || {
        while let Ok(event) = sub.recv() {
            tracing::debug!(
                event_type = event.event_type(),
                occurred_at = %event.occurred_at(),
                "inventory changed; invalidating section cache"
            );
            cache.invalidate();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use despensa_ai::FixedResponseModel;
    use std::time::Duration;

    async fn section_names(svc: &AppServices) -> Vec<String> {
        svc.sections().await.unwrap().into_iter().map(|s| s.name).collect()
    }

    async fn services(model_output: &str) -> AppServices {
        AppServices::with_parts(
            Arc::new(InMemoryInventoryStore::new()),
            Arc::new(FixedResponseModel::new(model_output)),
            &AppConfig::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn startup_seeds_default_sections() {
        let svc = services("[]").await;
        let names = section_names(&svc).await;
        assert_eq!(names, vec!["Almacén 1", "Almacén 2", "Refrigerador"]);
    }

    #[tokio::test]
    async fn committed_changes_invalidate_the_cache() {
        let svc = services(r#"[{"action": "create_section", "section": "congelador"}]"#).await;
        assert_eq!(svc.sections().await.unwrap().len(), 3);
        assert!(svc.sections.get().is_some());

        svc.processor.process("crea congelador", None).await.unwrap();

        for _ in 0..50 {
            if svc.sections.get().is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(svc.sections.get().is_none());
        assert_eq!(svc.sections().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn sections_are_fresh_right_after_a_committed_change() {
        let svc = services("[]").await;
        assert_eq!(svc.sections().await.unwrap().len(), 3);

        let report = svc
            .execute_raw(r#"[{"action": "create_section", "section": "congelador"}]"#)
            .await
            .unwrap();
        assert!(report.did_change());

        let names = section_names(&svc).await;
        assert!(names.contains(&"Congelador".to_string()), "{names:?}");
    }

    #[tokio::test]
    async fn unchanged_batches_keep_the_cache_warm() {
        let svc = services("[]").await;
        svc.sections().await.unwrap();

        let report = svc
            .execute_raw(r#"[{"action": "add", "item": "nada", "quantity": 1}]"#)
            .await
            .unwrap();
        assert!(!report.did_change());
        assert!(svc.sections.get().is_some());
    }

    #[tokio::test]
    async fn list_loaded_before_an_invalidation_is_not_cached() {
        let svc = services("[]").await;
        let generation = svc.sections.generation();
        let stale = svc.store.list_sections().await.unwrap();

        svc.execute_raw(r#"{"action": "create_section", "section": "congelador"}"#)
            .await
            .unwrap();

        assert!(!svc.sections.put(generation, stale));
        assert!(svc.sections.get().is_none());
        assert_eq!(svc.sections().await.unwrap().len(), 4);
    }

    #[test]
    fn put_at_the_current_generation_is_kept() {
        let cache = SectionCache::default();
        let generation = cache.generation();
        assert!(cache.put(generation, Vec::new()));
        assert_eq!(cache.get(), Some(Vec::new()));

        cache.invalidate();
        assert_eq!(cache.get(), None);
        assert_ne!(cache.generation(), generation);
    }

    #[tokio::test]
    async fn context_hint_lists_known_sections() {
        let svc = services("[]").await;
        let hint = svc.context_hint().await.unwrap();
        assert!(hint.starts_with("Secciones: Almacén 1, Almacén 2, Refrigerador."));
    }
}
