//! Backend-independent document types and the pure body transformations
//! shared by every [`DocumentStore`](crate::DocumentStore) implementation.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{Result, StoreError};

/// A JSON object body.
pub type Fields = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A stored document together with the metadata the store maintains for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub body: Fields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Store-wide revision assigned when the document was inserted.
    pub created_revision: u64,
    /// Store-wide revision assigned by the most recent write. Strictly
    /// increasing across all writes, so it orders documents by recency even
    /// when wall-clock timestamps collide.
    pub revision: u64,
}

/// Ordering for [`DocumentStore::list`](crate::DocumentStore::list).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Most recently written first.
    RecentlyUpdated,
    /// Most recently inserted first.
    RecentlyCreated,
}

impl SortOrder {
    pub fn sort(self, docs: &mut [Document]) {
        match self {
            Self::RecentlyUpdated => docs.sort_by(|a, b| b.revision.cmp(&a.revision)),
            Self::RecentlyCreated => {
                docs.sort_by(|a, b| b.created_revision.cmp(&a.created_revision))
            }
        }
    }
}

/// Whether a write inserted a new document or modified an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    /// The document already existed and was left as is.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub document: Document,
    pub outcome: WriteOutcome,
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Shallow merge: every top-level field of `patch` replaces the same field
/// of `body`.
pub fn merge_fields(body: &mut Fields, patch: &Fields) {
    for (name, value) in patch {
        body.insert(name.clone(), value.clone());
    }
}

/// Body for a document that does not exist yet: `defaults` overlaid with
/// `patch`.
pub fn created_body(defaults: Fields, patch: &Fields) -> Fields {
    let mut body = defaults;
    merge_fields(&mut body, patch);
    body
}

// ---------------------------------------------------------------------------
// Array append
// ---------------------------------------------------------------------------

/// Push `item` onto the array stored under `field` and apply `set` to the
/// same document, all or nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayAppend {
    pub field: String,
    pub item: Value,
    /// Name of the item property that identifies it within the array. When
    /// set, an item whose identifier is already present is not appended again
    /// and `set` is not applied.
    pub dedup_on: Option<String>,
    /// Top-level fields written alongside the push.
    pub set: Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    Duplicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Appended {
    pub document: Document,
    pub outcome: AppendOutcome,
}

impl ArrayAppend {
    pub fn new(field: impl Into<String>, item: Value) -> Self {
        Self {
            field: field.into(),
            item,
            dedup_on: None,
            set: Fields::new(),
        }
    }

    pub fn dedup_on(mut self, property: impl Into<String>) -> Self {
        self.dedup_on = Some(property.into());
        self
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    /// Apply the append to `body` in place. On [`AppendOutcome::Duplicate`]
    /// the body is untouched.
    pub fn apply(&self, body: &mut Fields) -> Result<AppendOutcome> {
        let array = body
            .entry(self.field.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        let Value::Array(items) = array else {
            return Err(StoreError::Corrupt(format!(
                "field '{}' is not an array",
                self.field
            )));
        };

        if let Some(property) = &self.dedup_on {
            let id = self.item.get(property).ok_or_else(|| {
                StoreError::Corrupt(format!("appended item has no '{property}' property"))
            })?;
            if items.iter().any(|existing| existing.get(property) == Some(id)) {
                return Ok(AppendOutcome::Duplicate);
            }
        }

        items.push(self.item.clone());
        merge_fields(body, &self.set);
        Ok(AppendOutcome::Appended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn append_pushes_and_sets_side_fields() {
        let mut body = fields(json!({ "messages": [], "lastMessage": "" }));
        let op = ArrayAppend::new("messages", json!({ "id": "1", "text": "hi" }))
            .dedup_on("id")
            .set("lastMessage", "hi");

        assert_eq!(op.apply(&mut body).unwrap(), AppendOutcome::Appended);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["lastMessage"], "hi");
    }

    #[test]
    fn duplicate_leaves_body_untouched() {
        let mut body = fields(json!({
            "messages": [{ "id": "1", "text": "old" }],
            "lastMessage": "old"
        }));
        let before = body.clone();
        let op = ArrayAppend::new("messages", json!({ "id": "1", "text": "new" }))
            .dedup_on("id")
            .set("lastMessage", "new");

        assert_eq!(op.apply(&mut body).unwrap(), AppendOutcome::Duplicate);
        assert_eq!(body, before);
    }

    #[test]
    fn missing_array_is_created() {
        let mut body = Fields::new();
        ArrayAppend::new("items", json!(1)).apply(&mut body).unwrap();
        assert_eq!(body["items"], json!([1]));
    }

    #[test]
    fn non_array_field_is_corrupt() {
        let mut body = fields(json!({ "messages": "nope" }));
        let err = ArrayAppend::new("messages", json!({})).apply(&mut body);
        assert!(matches!(err, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn created_body_overlays_patch_on_defaults() {
        let body = created_body(
            fields(json!({ "name": "", "unread": 0 })),
            &fields(json!({ "name": "Mom" })),
        );
        assert_eq!(Value::Object(body), json!({ "name": "Mom", "unread": 0 }));
    }
}
