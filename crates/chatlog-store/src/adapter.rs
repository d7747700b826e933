//! The storage seam consumed by the service layer.

use async_trait::async_trait;

use crate::document::{Appended, ArrayAppend, Document, Fields, Merged, SortOrder};
use crate::error::Result;

/// A keyed JSON document store.
///
/// Each method is atomic on its own: concurrent callers never observe a
/// half-applied write. Writes to the same `(collection, key)` are serialized
/// by the implementation; there is no cross-call transaction.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Verify the backend is reachable (connecting first if needed).
    async fn health_check(&self) -> Result<()>;

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>>;

    /// All documents of a collection. An empty or unknown collection yields
    /// an empty vector.
    async fn list(&self, collection: &str, order: SortOrder) -> Result<Vec<Document>>;

    /// Insert `body` under `key`, or replace the whole body of the existing
    /// document.
    async fn upsert(&self, collection: &str, key: &str, body: Fields) -> Result<Document>;

    /// Create the document from `defaults` overlaid with `patch` when absent,
    /// otherwise shallow-merge `patch` into the stored body.
    async fn merge(
        &self,
        collection: &str,
        key: &str,
        patch: Fields,
        defaults: Fields,
    ) -> Result<Merged>;

    /// Insert `body` only if `key` is free; return whichever document ends
    /// up stored.
    async fn insert_if_absent(&self, collection: &str, key: &str, body: Fields)
        -> Result<Merged>;

    /// Insert several new documents in order. Fails without writing anything
    /// if one of the keys is already taken.
    async fn insert_many(&self, collection: &str, docs: Vec<(String, Fields)>) -> Result<usize>;

    /// Remove every document of a collection and return how many were
    /// removed.
    async fn delete_all(&self, collection: &str) -> Result<u64>;

    /// Atomically push onto an array field and update side fields.
    ///
    /// Returns `None` when the document does not exist.
    async fn append_to_array_field(
        &self,
        collection: &str,
        key: &str,
        op: ArrayAppend,
    ) -> Result<Option<Appended>>;
}
