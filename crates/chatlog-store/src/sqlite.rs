//! SQLite implementation of [`DocumentStore`].

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::adapter::DocumentStore;
use crate::database::Database;
use crate::document::{Appended, ArrayAppend, Document, Fields, Merged, SortOrder};
use crate::error::{Result, StoreError};

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

impl Location {
    fn open(&self) -> Result<Database> {
        match self {
            Self::File(path) => Database::open_at(path),
            Self::Memory => Database::open_in_memory(),
        }
    }
}

/// SQLite-backed document store.
///
/// The connection is opened on first use, exactly once: concurrent first
/// callers wait on the same initialization instead of racing to open the
/// file. Afterwards every operation runs on a blocking thread while holding
/// the connection mutex, so no async task ever awaits with the lock held.
pub struct SqliteStore {
    location: Location,
    db: OnceCell<Arc<Mutex<Database>>>,
}

impl SqliteStore {
    /// A store backed by the file at `path`. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            db: OnceCell::new(),
        }
    }

    /// A store backed by a private in-memory SQLite database.
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            db: OnceCell::new(),
        }
    }

    /// Whether the connection has been opened.
    pub fn is_connected(&self) -> bool {
        self.db.initialized()
    }

    async fn db(&self) -> Result<&Arc<Mutex<Database>>> {
        self.db
            .get_or_try_init(|| async {
                let location = self.location.clone();
                let db = tokio::task::spawn_blocking(move || location.open())
                    .await
                    .map_err(|e| StoreError::Unavailable(format!("connect task failed: {e}")))??;
                info!(location = ?self.location, "SQLite store connected");
                Ok::<_, StoreError>(Arc::new(Mutex::new(db)))
            })
            .await
    }

    /// Run `f` against the database on a blocking thread.
    async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(self.db().await?);
        tokio::task::spawn_blocking(move || {
            let mut guard = db
                .lock()
                .map_err(|_| StoreError::Unavailable("database lock poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("storage task failed: {e}")))?
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn health_check(&self) -> Result<()> {
        self.call(|db| {
            db.conn().query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let (collection, key) = (collection.to_string(), key.to_string());
        self.call(move |db| db.get_document(&collection, &key)).await
    }

    async fn list(&self, collection: &str, order: SortOrder) -> Result<Vec<Document>> {
        let collection = collection.to_string();
        self.call(move |db| db.list_documents(&collection, order))
            .await
    }

    async fn upsert(&self, collection: &str, key: &str, body: Fields) -> Result<Document> {
        let (collection, key) = (collection.to_string(), key.to_string());
        self.call(move |db| db.put_document(&collection, &key, &body))
            .await
    }

    async fn merge(
        &self,
        collection: &str,
        key: &str,
        patch: Fields,
        defaults: Fields,
    ) -> Result<Merged> {
        let (collection, key) = (collection.to_string(), key.to_string());
        self.call(move |db| db.merge_document(&collection, &key, &patch, defaults))
            .await
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        key: &str,
        body: Fields,
    ) -> Result<Merged> {
        let (collection, key) = (collection.to_string(), key.to_string());
        self.call(move |db| db.insert_document_if_absent(&collection, &key, &body))
            .await
    }

    async fn insert_many(&self, collection: &str, docs: Vec<(String, Fields)>) -> Result<usize> {
        let collection = collection.to_string();
        self.call(move |db| db.insert_documents(&collection, &docs))
            .await
    }

    async fn delete_all(&self, collection: &str) -> Result<u64> {
        let owned = collection.to_string();
        let removed = self.call(move |db| db.delete_collection(&owned)).await?;
        debug!(collection, removed, "collection cleared");
        Ok(removed)
    }

    async fn append_to_array_field(
        &self,
        collection: &str,
        key: &str,
        op: ArrayAppend,
    ) -> Result<Option<Appended>> {
        let (collection, key) = (collection.to_string(), key.to_string());
        self.call(move |db| db.append_to_array(&collection, &key, &op))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::AppendOutcome;
    use serde_json::json;

    #[tokio::test]
    async fn connects_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("lazy.db"));
        assert!(!store.is_connected());

        assert!(store.list("chats", SortOrder::RecentlyUpdated).await.unwrap().is_empty());
        assert!(store.is_connected());
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("durable.db");

        {
            let store = SqliteStore::new(&path);
            let body = json!({ "name": "Mom" }).as_object().unwrap().clone();
            store.upsert("chats", "1", body).await.unwrap();
        }

        let store = SqliteStore::new(&path);
        let doc = store.get("chats", "1").await.unwrap().unwrap();
        assert_eq!(doc.body["name"], "Mom");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_not_lost() {
        let store = Arc::new(SqliteStore::in_memory());
        let body = json!({ "messages": [] }).as_object().unwrap().clone();
        store.upsert("chats", "1", body).await.unwrap();

        let tasks = (0..40).map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let op = ArrayAppend::new("messages", json!({ "id": i.to_string() }))
                    .dedup_on("id")
                    .set("last", i);
                store.append_to_array_field("chats", "1", op).await
            })
        });

        for result in futures::future::join_all(tasks).await {
            let appended = result.unwrap().unwrap().unwrap();
            assert_eq!(appended.outcome, AppendOutcome::Appended);
        }

        let doc = store.get("chats", "1").await.unwrap().unwrap();
        let messages = doc.body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 40);
        assert_eq!(messages.last().unwrap()["id"], doc.body["last"].to_string());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_to_different_documents_stay_separate() {
        let store = Arc::new(SqliteStore::in_memory());
        for key in ["a", "b"] {
            let body = json!({ "messages": [] }).as_object().unwrap().clone();
            store.upsert("chats", key, body).await.unwrap();
        }

        let tasks = (0..30).map(|i| {
            let store = Arc::clone(&store);
            let key = if i % 2 == 0 { "a" } else { "b" };
            tokio::spawn(async move {
                let op = ArrayAppend::new("messages", json!({ "id": i.to_string() }))
                    .dedup_on("id")
                    .set("last", i);
                store.append_to_array_field("chats", key, op).await
            })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap().unwrap();
        }

        for (key, parity) in [("a", 0), ("b", 1)] {
            let doc = store.get("chats", key).await.unwrap().unwrap();
            let messages = doc.body["messages"].as_array().unwrap();
            assert_eq!(messages.len(), 15);
            assert!(messages.iter().all(|m| {
                let id: i32 = m["id"].as_str().unwrap().parse().unwrap();
                id % 2 == parity
            }));
        }
    }
}
