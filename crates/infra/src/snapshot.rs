//! Advisory snapshot of known names, forwarded to the model with each utterance.

use crate::store::{InventoryStore, ItemQuery, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventorySnapshot {
    pub sections: Vec<String>,
    pub items: Vec<String>,
}

impl InventorySnapshot {
    pub async fn load(store: &dyn InventoryStore) -> Result<Self, StoreError> {
        let sections = store.list_sections().await?.into_iter().map(|s| s.name).collect();
        let mut items: Vec<String> = store
            .list_items(ItemQuery::all())
            .await?
            .into_iter()
            .map(|it| it.name)
            .collect();
        items.sort_by_key(|name| name.to_lowercase());
        Ok(Self { sections, items })
    }

    /// `Secciones: a, b. Items: x, y.`; empty parts are left out.
    pub fn render(&self) -> Option<String> {
        let mut parts = Vec::new();
        if !self.sections.is_empty() {
            parts.push(format!("Secciones: {}.", self.sections.join(", ")));
        }
        if !self.items.is_empty() {
            parts.push(format!("Items: {}.", self.items.join(", ")));
        }
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_default_sections;
    use crate::store::InMemoryInventoryStore;

    #[test]
    fn render_joins_names() {
        let snapshot = InventorySnapshot {
            sections: vec!["Refrigerador".into(), "Almacén 1".into()],
            items: vec!["leche".into()],
        };
        assert_eq!(
            snapshot.render().as_deref(),
            Some("Secciones: Refrigerador, Almacén 1. Items: leche.")
        );
        assert_eq!(InventorySnapshot::default().render(), None);
    }

    #[tokio::test]
    async fn load_reads_sections_from_store() {
        let store = InMemoryInventoryStore::new();
        seed_default_sections(&store).await.unwrap();

        let snapshot = InventorySnapshot::load(&store).await.unwrap();
        assert_eq!(snapshot.sections.len(), 3);
        assert!(snapshot.items.is_empty());
        assert_eq!(
            snapshot.render().as_deref(),
            Some("Secciones: Almacén 1, Almacén 2, Refrigerador.")
        );
    }
}
