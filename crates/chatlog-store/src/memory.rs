//! In-process implementation of [`DocumentStore`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::adapter::DocumentStore;
use crate::document::{
    created_body, merge_fields, AppendOutcome, Appended, ArrayAppend, Document, Fields, Merged,
    SortOrder, WriteOutcome,
};
use crate::error::{Result, StoreError};

#[derive(Default)]
struct Inner {
    collections: HashMap<String, HashMap<String, Document>>,
    revision: u64,
}

impl Inner {
    fn get(&self, collection: &str, key: &str) -> Option<&Document> {
        self.collections.get(collection)?.get(key)
    }

    /// Store `body` under `key`, keeping creation metadata of an existing
    /// document.
    fn write(&mut self, collection: &str, key: &str, body: Fields) -> Document {
        self.revision += 1;
        let revision = self.revision;
        let now = Utc::now();

        let docs = self.collections.entry(collection.to_string()).or_default();
        let (created_at, created_revision) = match docs.get(key) {
            Some(existing) => (existing.created_at, existing.created_revision),
            None => (now, revision),
        };

        let doc = Document {
            key: key.to_string(),
            body,
            created_at,
            updated_at: now,
            created_revision,
            revision,
        };
        docs.insert(key.to_string(), doc.clone());
        doc
    }
}

/// Document store that lives in process memory.
///
/// All state sits behind one synchronous mutex. No method awaits while
/// holding it, so every operation is a single critical section.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> Result<()> {
        self.lock().map(|_| ())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        Ok(self.lock()?.get(collection, key).cloned())
    }

    async fn list(&self, collection: &str, order: SortOrder) -> Result<Vec<Document>> {
        let mut docs: Vec<Document> = self
            .lock()?
            .collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();
        order.sort(&mut docs);
        Ok(docs)
    }

    async fn upsert(&self, collection: &str, key: &str, body: Fields) -> Result<Document> {
        Ok(self.lock()?.write(collection, key, body))
    }

    async fn merge(
        &self,
        collection: &str,
        key: &str,
        patch: Fields,
        defaults: Fields,
    ) -> Result<Merged> {
        let mut inner = self.lock()?;
        let merged = match inner.get(collection, key) {
            Some(existing) => {
                let mut body = existing.body.clone();
                merge_fields(&mut body, &patch);
                Merged {
                    document: inner.write(collection, key, body),
                    outcome: WriteOutcome::Updated,
                }
            }
            None => Merged {
                document: inner.write(collection, key, created_body(defaults, &patch)),
                outcome: WriteOutcome::Created,
            },
        };
        Ok(merged)
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        key: &str,
        body: Fields,
    ) -> Result<Merged> {
        let mut inner = self.lock()?;
        if let Some(existing) = inner.get(collection, key) {
            return Ok(Merged {
                document: existing.clone(),
                outcome: WriteOutcome::Unchanged,
            });
        }
        Ok(Merged {
            document: inner.write(collection, key, body),
            outcome: WriteOutcome::Created,
        })
    }

    async fn insert_many(&self, collection: &str, docs: Vec<(String, Fields)>) -> Result<usize> {
        let mut inner = self.lock()?;
        for (index, (key, _)) in docs.iter().enumerate() {
            let repeated_in_batch = docs[..index].iter().any(|(k, _)| k == key);
            if repeated_in_batch || inner.get(collection, key).is_some() {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    key: key.clone(),
                });
            }
        }

        let count = docs.len();
        for (key, body) in docs {
            inner.write(collection, &key, body);
        }
        Ok(count)
    }

    async fn delete_all(&self, collection: &str) -> Result<u64> {
        let removed = self
            .lock()?
            .collections
            .remove(collection)
            .map(|docs| docs.len() as u64)
            .unwrap_or(0);
        Ok(removed)
    }

    async fn append_to_array_field(
        &self,
        collection: &str,
        key: &str,
        op: ArrayAppend,
    ) -> Result<Option<Appended>> {
        let mut inner = self.lock()?;
        let Some(existing) = inner.get(collection, key) else {
            return Ok(None);
        };

        let mut body = existing.body.clone();
        let appended = match op.apply(&mut body)? {
            AppendOutcome::Duplicate => Appended {
                document: existing.clone(),
                outcome: AppendOutcome::Duplicate,
            },
            AppendOutcome::Appended => Appended {
                document: inner.write(collection, key, body),
                outcome: AppendOutcome::Appended,
            },
        };
        Ok(Some(appended))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Fields {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn unknown_collection_lists_empty() {
        let store = MemoryStore::new();
        assert!(store
            .list("chats", SortOrder::RecentlyUpdated)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn insert_if_absent_keeps_first_body() {
        let store = MemoryStore::new();
        let first = store
            .insert_if_absent("profiles", "me", body(json!({ "name": "A" })))
            .await
            .unwrap();
        let second = store
            .insert_if_absent("profiles", "me", body(json!({ "name": "B" })))
            .await
            .unwrap();

        assert_eq!(first.outcome, WriteOutcome::Created);
        assert_eq!(second.outcome, WriteOutcome::Unchanged);
        assert_eq!(second.document.body["name"], "A");
    }

    #[tokio::test]
    async fn insert_many_rejects_repeated_keys_in_batch() {
        let store = MemoryStore::new();
        let err = store
            .insert_many(
                "calls",
                vec![("1".into(), Fields::new()), ("1".into(), Fields::new())],
            )
            .await;
        assert!(matches!(err, Err(StoreError::DuplicateKey { .. })));
        assert_eq!(store.delete_all("calls").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_recently_created_ignores_updates() {
        let store = MemoryStore::new();
        store
            .insert_many(
                "calls",
                vec![("1".into(), Fields::new()), ("2".into(), Fields::new())],
            )
            .await
            .unwrap();
        store.upsert("calls", "1", Fields::new()).await.unwrap();

        let keys: Vec<String> = store
            .list("calls", SortOrder::RecentlyCreated)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.key)
            .collect();
        assert_eq!(keys, ["2", "1"]);
    }
}
