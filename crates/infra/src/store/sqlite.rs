//! SQLite-backed inventory store.
//!
//! Three tables: `sections`, `items` and the append-only `item_history`.
//! Case-insensitive lookups go through a `name_key` column holding the
//! trimmed, lower-cased name, so matching does not depend on SQLite's
//! ASCII-only `lower()`.
//!
//! ## Error Mapping
//!
//! | SQLx error | StoreError |
//! |------------|------------|
//! | unique violation | `Conflict` |
//! | foreign key violation | `Conflict` |
//! | any other database / pool / IO error | `Storage` |
//!
//! A session wraps one `BEGIN IMMEDIATE` transaction: it takes the write lock
//! up front, so overlapping batches queue on the busy timeout instead of
//! failing when a reader tries to upgrade to a writer.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::instrument;

use despensa_core::{HistoryId, ItemId, SectionId};
use despensa_inventory::{HistoryRecord, Item, NewItem, NewSection, Section, name_key};

use super::{InventorySession, InventoryStore, ItemQuery, StoreError};

const SCHEMA: [&str; 5] = [
    r#"
    CREATE TABLE IF NOT EXISTS sections (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        name_key    TEXT NOT NULL UNIQUE,
        emoji       TEXT NOT NULL,
        created_at  TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        name_key    TEXT NOT NULL,
        emoji       TEXT NOT NULL,
        quantity    REAL NOT NULL,
        unit        TEXT NOT NULL,
        threshold   REAL NOT NULL,
        section_id  INTEGER NOT NULL REFERENCES sections(id),
        updated_at  TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS items_name_key ON items (name_key)",
    "CREATE INDEX IF NOT EXISTS items_section_id ON items (section_id)",
    r#"
    CREATE TABLE IF NOT EXISTS item_history (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        item_id     INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
        quantity    REAL NOT NULL,
        changed_at  TEXT NOT NULL
    )
    "#,
];

/// How long a batch waits for another batch's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const ITEM_COLUMNS: &str = "id, name, emoji, quantity, unit, threshold, section_id, updated_at";
const SECTION_COLUMNS: &str = "id, name, emoji, created_at";

/// SQLite inventory store.
#[derive(Debug, Clone)]
pub struct SqliteInventoryStore {
    pool: SqlitePool,
}

impl SqliteInventoryStore {
    /// Connect to `url` (e.g. `sqlite://inventario.db`), creating the file if
    /// needed, and apply the schema.
    ///
    /// `sqlite::memory:` gets a single connection that is never recycled:
    /// every connection to an in-memory URL sees its own empty database.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| map_sqlx_error("connect", e))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let mut pool_options = SqlitePoolOptions::new().max_connections(5);
        if url.contains(":memory:") {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Fresh private in-memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect("sqlite::memory:").await
    }

    /// Create tables and indexes if they do not exist.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for SqliteInventoryStore {
    #[instrument(skip(self), err)]
    async fn begin(&self) -> Result<Box<dyn InventorySession>, StoreError> {
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(Box::new(SqliteSession { tx: Some(tx) }))
    }

    #[instrument(skip(self), err)]
    async fn list_sections(&self) -> Result<Vec<Section>, StoreError> {
        let sql = format!("SELECT {SECTION_COLUMNS} FROM sections ORDER BY name_key ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_sections", e))?;
        rows.iter()
            .map(section_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_sections", e))
    }

    #[instrument(skip(self), err)]
    async fn list_items(&self, query: ItemQuery) -> Result<Vec<Item>, StoreError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE (?1 IS NULL OR section_id = ?1) \
             ORDER BY updated_at DESC, id DESC \
             LIMIT ?2 OFFSET ?3"
        );
        let rows = sqlx::query(&sql)
            .bind(query.section_id.map(SectionId::get))
            .bind(to_sql_count(query.limit))
            .bind(to_sql_count(query.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_items", e))?;
        rows.iter()
            .map(item_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_items", e))
    }

    #[instrument(skip(self), err)]
    async fn item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("item", e))?;
        row.as_ref()
            .map(item_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("item", e))
    }

    #[instrument(skip(self), err)]
    async fn section(&self, id: SectionId) -> Result<Option<Section>, StoreError> {
        let sql = format!("SELECT {SECTION_COLUMNS} FROM sections WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("section", e))?;
        row.as_ref()
            .map(section_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("section", e))
    }

    #[instrument(skip(self), err)]
    async fn item_history(
        &self,
        item_id: ItemId,
        limit: usize,
    ) -> Result<Vec<HistoryRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_id, quantity, changed_at
            FROM item_history
            WHERE item_id = ?1
            ORDER BY changed_at DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(item_id.get())
        .bind(to_sql_count(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("item_history", e))?;
        rows.iter()
            .map(history_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("item_history", e))
    }
}

/// One SQLite transaction. `tx` is `None` once committed or rolled back.
struct SqliteSession {
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteSession {
    fn tx(&mut self) -> Result<&mut Transaction<'static, Sqlite>, StoreError> {
        self.tx
            .as_mut()
            .ok_or_else(|| StoreError::Storage("session already finished".to_string()))
    }

    async fn fetch_section(&mut self, id: SectionId) -> Result<Option<Section>, StoreError> {
        let sql = format!("SELECT {SECTION_COLUMNS} FROM sections WHERE id = ?1");
        let tx = self.tx()?;
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("section", e))?;
        row.as_ref()
            .map(section_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("section", e))
    }
}

#[async_trait]
impl InventorySession for SqliteSession {
    #[instrument(skip(self), err)]
    async fn find_item_by_name(&mut self, name: &str) -> Result<Option<Item>, StoreError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE name_key = ?1 ORDER BY id ASC LIMIT 1"
        );
        let tx = self.tx()?;
        let row = sqlx::query(&sql)
            .bind(name_key(name))
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("find_item_by_name", e))?;
        row.as_ref()
            .map(item_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("find_item_by_name", e))
    }

    #[instrument(skip(self), err)]
    async fn find_section_by_name(&mut self, name: &str) -> Result<Option<Section>, StoreError> {
        let sql = format!("SELECT {SECTION_COLUMNS} FROM sections WHERE name_key = ?1");
        let tx = self.tx()?;
        let row = sqlx::query(&sql)
            .bind(name_key(name))
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("find_section_by_name", e))?;
        row.as_ref()
            .map(section_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("find_section_by_name", e))
    }

    async fn section(&mut self, id: SectionId) -> Result<Option<Section>, StoreError> {
        self.fetch_section(id).await
    }

    #[instrument(skip(self), fields(name = %new.name), err)]
    async fn create_section(&mut self, new: NewSection) -> Result<Section, StoreError> {
        let created_at = Utc::now();
        let key = new.key();
        let tx = self.tx()?;
        let result = sqlx::query(
            "INSERT INTO sections (name, name_key, emoji, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&new.name)
        .bind(&key)
        .bind(&new.emoji)
        .bind(created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("create_section", e))?;

        Ok(Section {
            id: SectionId::new(result.last_insert_rowid()),
            name: new.name,
            emoji: new.emoji,
            created_at,
        })
    }

    #[instrument(skip(self), fields(name = %new.name), err)]
    async fn create_item(&mut self, new: NewItem) -> Result<Item, StoreError> {
        new.validate()?;
        let updated_at = Utc::now();
        let name = new.name.trim().to_string();
        let key = new.key();
        let tx = self.tx()?;
        let result = sqlx::query(
            r#"
            INSERT INTO items
                (name, name_key, emoji, quantity, unit, threshold, section_id, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&name)
        .bind(&key)
        .bind(&new.emoji)
        .bind(new.quantity)
        .bind(&new.unit)
        .bind(new.threshold)
        .bind(new.section_id.get())
        .bind(updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("create_item", e))?;

        Ok(Item {
            id: ItemId::new(result.last_insert_rowid()),
            name,
            emoji: new.emoji,
            quantity: new.quantity,
            unit: new.unit,
            threshold: new.threshold,
            section_id: new.section_id,
            updated_at,
        })
    }

    #[instrument(skip(self, item), fields(item_id = %item.id), err)]
    async fn update_item(&mut self, item: &Item) -> Result<(), StoreError> {
        let tx = self.tx()?;
        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = ?1, name_key = ?2, emoji = ?3, quantity = ?4, unit = ?5,
                threshold = ?6, section_id = ?7, updated_at = ?8
            WHERE id = ?9
            "#,
        )
        .bind(&item.name)
        .bind(item.key())
        .bind(&item.emoji)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(item.threshold)
        .bind(item.section_id.get())
        .bind(item.updated_at)
        .bind(item.id.get())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("item {}", item.id)));
        }
        Ok(())
    }

    #[instrument(skip(self, section), fields(section_id = %section.id), err)]
    async fn update_section(&mut self, section: &Section) -> Result<(), StoreError> {
        let tx = self.tx()?;
        let result =
            sqlx::query("UPDATE sections SET name = ?1, name_key = ?2, emoji = ?3 WHERE id = ?4")
                .bind(&section.name)
                .bind(section.key())
                .bind(&section.emoji)
                .bind(section.id.get())
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("update_section", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("section {}", section.id)));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_items_in_section(
        &mut self,
        section_id: SectionId,
    ) -> Result<Vec<Item>, StoreError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE section_id = ?1 ORDER BY id ASC");
        let tx = self.tx()?;
        let rows = sqlx::query(&sql)
            .bind(section_id.get())
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("list_items_in_section", e))?;
        rows.iter()
            .map(item_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_items_in_section", e))
    }

    #[instrument(skip(self), err)]
    async fn delete_item(&mut self, id: ItemId) -> Result<(), StoreError> {
        let tx = self.tx()?;
        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id.get())
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("item {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete_section(&mut self, id: SectionId) -> Result<(), StoreError> {
        let tx = self.tx()?;
        let result = sqlx::query("DELETE FROM sections WHERE id = ?1")
            .bind(id.get())
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("delete_section", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("section {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn record_history(
        &mut self,
        item_id: ItemId,
        quantity: f64,
    ) -> Result<HistoryRecord, StoreError> {
        let changed_at = Utc::now();
        let tx = self.tx()?;
        let result = sqlx::query(
            "INSERT INTO item_history (item_id, quantity, changed_at) VALUES (?1, ?2, ?3)",
        )
        .bind(item_id.get())
        .bind(quantity)
        .bind(changed_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("record_history", e))?;

        Ok(HistoryRecord {
            id: HistoryId::new(result.last_insert_rowid()),
            item_id,
            quantity,
            changed_at,
        })
    }

    #[instrument(skip(self), err)]
    async fn commit(&mut self) -> Result<(), StoreError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| StoreError::Storage("session already finished".to_string()))?;
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))
    }

    #[instrument(skip(self), err)]
    async fn rollback(&mut self) -> Result<(), StoreError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| StoreError::Storage("session already finished".to_string()))?;
        tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))
    }
}

fn to_sql_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn section_from_row(row: &SqliteRow) -> Result<Section, sqlx::Error> {
    Ok(Section {
        id: SectionId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        emoji: row.try_get("emoji")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn item_from_row(row: &SqliteRow) -> Result<Item, sqlx::Error> {
    Ok(Item {
        id: ItemId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        emoji: row.try_get("emoji")?,
        quantity: row.try_get("quantity")?,
        unit: row.try_get("unit")?,
        threshold: row.try_get("threshold")?,
        section_id: SectionId::new(row.try_get("section_id")?),
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn history_from_row(row: &SqliteRow) -> Result<HistoryRecord, sqlx::Error> {
    Ok(HistoryRecord {
        id: HistoryId::new(row.try_get("id")?),
        item_id: ItemId::new(row.try_get("item_id")?),
        quantity: row.try_get("quantity")?,
        changed_at: row.try_get::<DateTime<Utc>, _>("changed_at")?,
    })
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
                StoreError::Conflict(msg)
            } else {
                StoreError::Storage(msg)
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Storage(format!("sqlx error in {}: {}", operation, err)),
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

    /// Fresh database file under the temp dir, removed on drop.
    struct TempDb(std::path::PathBuf);

    impl TempDb {
        fn new() -> Self {
            Self(std::env::temp_dir().join(format!("despensa-{}.db", uuid::Uuid::now_v7())))
        }

        fn url(&self) -> String {
            format!("sqlite://{}", self.0.display())
        }
    }

    impl Drop for TempDb {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[tokio::test]
    async fn overlapping_sessions_queue_instead_of_failing() {
        let db = TempDb::new();
        let store = SqliteInventoryStore::connect(&db.url()).await.unwrap();

        let mut first = store.begin().await.unwrap();
        assert!(first.find_section_by_name("congelador").await.unwrap().is_none());

        let second_store = store.clone();
        let second = tokio::spawn(async move {
            let mut session = second_store.begin().await?;
            let seen = session.find_section_by_name("congelador").await?;
            session
                .create_section(NewSection::new("despensa", None))
                .await?;
            session.commit().await?;
            Ok::<_, StoreError>(seen)
        });

        first
            .create_section(NewSection::new("congelador", None))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        first.commit().await.unwrap();

        let seen = second.await.unwrap().expect("second batch must not fail");
        assert_eq!(seen.map(|s| s.name).as_deref(), Some("Congelador"));
        assert_eq!(store.list_sections().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let store = SqliteInventoryStore::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        assert!(store.list_sections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn committed_writes_are_readable() {
        let store = SqliteInventoryStore::in_memory().await.unwrap();
        let mut session = store.begin().await.unwrap();
        let section = session
            .create_section(NewSection::new("refrigerador", Some("🧊")))
            .await
            .unwrap();
        let item = session.create_item(new_item("Leche", 2.0, section.id)).await.unwrap();
        session.record_history(item.id, 2.0).await.unwrap();
        session.commit().await.unwrap();

        let stored = store.item(item.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Leche");
        assert_eq!(stored.quantity, 2.0);
        assert_eq!(store.section(section.id).await.unwrap().unwrap().name, "Refrigerador");

        let history = store.item_history(item.id, 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].quantity, 2.0);
    }

    #[tokio::test]
    async fn lookups_are_case_insensitive_beyond_ascii() {
        let store = SqliteInventoryStore::in_memory().await.unwrap();
        let mut session = store.begin().await.unwrap();
        session.create_section(NewSection::new("almacén 1", None)).await.unwrap();

        let found = session.find_section_by_name("ALMACÉN 1").await.unwrap();
        assert_eq!(found.map(|s| s.name), Some("Almacén 1".to_string()));
    }

    #[tokio::test]
    async fn rollback_discards_writes() {
        let store = SqliteInventoryStore::in_memory().await.unwrap();
        let mut session = store.begin().await.unwrap();
        session.create_section(NewSection::new("congelador", None)).await.unwrap();
        session.rollback().await.unwrap();

        assert!(store.list_sections().await.unwrap().is_empty());
        assert!(session.commit().await.unwrap_err().is_fatal());
    }

    #[tokio::test]
    async fn unique_and_foreign_key_violations_are_conflicts() {
        let store = SqliteInventoryStore::in_memory().await.unwrap();
        let mut session = store.begin().await.unwrap();
        let section = session.create_section(NewSection::new("despensa", None)).await.unwrap();

        let dup = session
            .create_section(NewSection::new("DESPENSA", None))
            .await
            .unwrap_err();
        assert!(matches!(dup, StoreError::Conflict(_)));

        session.create_item(new_item("pan", 1.0, section.id)).await.unwrap();
        let busy = session.delete_section(section.id).await.unwrap_err();
        assert!(matches!(busy, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_an_item_cascades_to_history() {
        let store = SqliteInventoryStore::in_memory().await.unwrap();
        let mut session = store.begin().await.unwrap();
        let section = session.create_section(NewSection::new("a", None)).await.unwrap();
        let item = session.create_item(new_item("pan", 1.0, section.id)).await.unwrap();
        session.record_history(item.id, 1.0).await.unwrap();
        session.delete_item(item.id).await.unwrap();
        session.commit().await.unwrap();

        assert!(store.item_history(item.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn items_filter_by_section_and_page() {
        let store = SqliteInventoryStore::in_memory().await.unwrap();
        let mut session = store.begin().await.unwrap();
        let a = session.create_section(NewSection::new("a", None)).await.unwrap();
        let b = session.create_section(NewSection::new("b", None)).await.unwrap();
        session.create_item(new_item("uno", 1.0, a.id)).await.unwrap();
        session.create_item(new_item("dos", 1.0, b.id)).await.unwrap();
        session.create_item(new_item("tres", 1.0, a.id)).await.unwrap();
        session.commit().await.unwrap();

        let in_a = store.list_items(ItemQuery::all().in_section(a.id)).await.unwrap();
        assert_eq!(in_a.len(), 2);
        assert!(in_a.iter().all(|it| it.section_id == a.id));

        let page = store.list_items(ItemQuery::page(1, 1)).await.unwrap();
        assert_eq!(page.len(), 1);
    }
}
