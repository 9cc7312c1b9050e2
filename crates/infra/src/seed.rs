//! Startup seeding.

use despensa_inventory::default_sections;

use crate::store::{InventoryStore, StoreError};

/// Create the default sections that do not exist yet. Returns how many were
/// created. Running it again is a no-op.
pub async fn seed_default_sections(store: &dyn InventoryStore) -> Result<usize, StoreError> {
    let mut session = store.begin().await?;
    let mut created = 0;

    for section in default_sections() {
        if session.find_section_by_name(&section.name).await?.is_none() {
            session.create_section(section).await?;
            created += 1;
        }
    }

    session.commit().await?;
    if created > 0 {
        tracing::info!(created, "seeded default sections");
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryInventoryStore;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let store = InMemoryInventoryStore::new();
        assert_eq!(seed_default_sections(&store).await.unwrap(), 3);
        assert_eq!(seed_default_sections(&store).await.unwrap(), 0);

        let names: Vec<String> = store
            .list_sections()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Almacén 1", "Almacén 2", "Refrigerador"]);
    }
}
