//! CRUD operations on the `documents` table.
//!
//! Every mutating helper runs inside an `IMMEDIATE` transaction so that the
//! read-modify-write it performs is atomic with respect to other connections
//! to the same file.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::database::Database;
use crate::document::{
    created_body, merge_fields, AppendOutcome, Appended, ArrayAppend, Document, Fields, Merged,
    SortOrder, WriteOutcome,
};
use crate::error::{Result, StoreError};

const SELECT_COLUMNS: &str =
    "key, body, created_at, updated_at, created_rev, updated_rev FROM documents";

impl Database {
    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_document(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        load(self.conn(), collection, key)
    }

    pub fn list_documents(&self, collection: &str, order: SortOrder) -> Result<Vec<Document>> {
        let order_by = match order {
            SortOrder::RecentlyUpdated => "updated_rev DESC",
            SortOrder::RecentlyCreated => "created_rev DESC",
        };
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {SELECT_COLUMNS} WHERE collection = ?1 ORDER BY {order_by}"
        ))?;

        let rows = stmt.query_map(params![collection], row_to_document)?;

        let mut docs = Vec::new();
        for row in rows {
            docs.push(row?);
        }
        Ok(docs)
    }

    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    pub fn put_document(&mut self, collection: &str, key: &str, body: &Fields) -> Result<Document> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing = load(&tx, collection, key)?;
        let doc = write(&tx, collection, key, body, existing.as_ref())?;
        tx.commit()?;
        Ok(doc)
    }

    pub fn merge_document(
        &mut self,
        collection: &str,
        key: &str,
        patch: &Fields,
        defaults: Fields,
    ) -> Result<Merged> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let merged = match load(&tx, collection, key)? {
            Some(existing) => {
                let mut body = existing.body.clone();
                merge_fields(&mut body, patch);
                Merged {
                    document: write(&tx, collection, key, &body, Some(&existing))?,
                    outcome: WriteOutcome::Updated,
                }
            }
            None => {
                let body = created_body(defaults, patch);
                Merged {
                    document: write(&tx, collection, key, &body, None)?,
                    outcome: WriteOutcome::Created,
                }
            }
        };

        tx.commit()?;
        Ok(merged)
    }

    pub fn insert_document_if_absent(
        &mut self,
        collection: &str,
        key: &str,
        body: &Fields,
    ) -> Result<Merged> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let merged = match load(&tx, collection, key)? {
            Some(existing) => Merged {
                document: existing,
                outcome: WriteOutcome::Unchanged,
            },
            None => Merged {
                document: write(&tx, collection, key, body, None)?,
                outcome: WriteOutcome::Created,
            },
        };

        tx.commit()?;
        Ok(merged)
    }

    pub fn insert_documents(
        &mut self,
        collection: &str,
        docs: &[(String, Fields)],
    ) -> Result<usize> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        for (key, body) in docs {
            // Rows written earlier in this transaction are visible here, so a
            // key repeated within the batch is caught too. Dropping the
            // transaction rolls back earlier inserts.
            if load(&tx, collection, key)?.is_some() {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    key: key.clone(),
                });
            }
            write(&tx, collection, key, body, None)?;
        }

        tx.commit()?;
        Ok(docs.len())
    }

    pub fn delete_collection(&self, collection: &str) -> Result<u64> {
        let affected = self.conn().execute(
            "DELETE FROM documents WHERE collection = ?1",
            params![collection],
        )?;
        Ok(affected as u64)
    }

    pub fn append_to_array(
        &mut self,
        collection: &str,
        key: &str,
        op: &ArrayAppend,
    ) -> Result<Option<Appended>> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(existing) = load(&tx, collection, key)? else {
            return Ok(None);
        };

        let mut body = existing.body.clone();
        let appended = match op.apply(&mut body)? {
            AppendOutcome::Duplicate => Appended {
                document: existing,
                outcome: AppendOutcome::Duplicate,
            },
            AppendOutcome::Appended => Appended {
                document: write(&tx, collection, key, &body, Some(&existing))?,
                outcome: AppendOutcome::Appended,
            },
        };

        tx.commit()?;
        Ok(Some(appended))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load(conn: &Connection, collection: &str, key: &str) -> Result<Option<Document>> {
    let doc = conn
        .query_row(
            &format!("SELECT {SELECT_COLUMNS} WHERE collection = ?1 AND key = ?2"),
            params![collection, key],
            row_to_document,
        )
        .optional()?;
    Ok(doc)
}

fn next_revision(conn: &Connection) -> Result<u64> {
    conn.execute(
        "UPDATE revision_counter SET value = value + 1 WHERE id = 1",
        [],
    )?;
    let value: i64 = conn.query_row(
        "SELECT value FROM revision_counter WHERE id = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(value as u64)
}

/// Insert a new row, or overwrite the body of `existing` keeping its
/// creation metadata.
fn write(
    conn: &Connection,
    collection: &str,
    key: &str,
    body: &Fields,
    existing: Option<&Document>,
) -> Result<Document> {
    let now = Utc::now();
    let revision = next_revision(conn)?;
    let json = serde_json::to_string(body)?;

    let (created_at, created_revision) = match existing {
        Some(doc) => {
            conn.execute(
                "UPDATE documents SET body = ?3, updated_at = ?4, updated_rev = ?5
                 WHERE collection = ?1 AND key = ?2",
                params![collection, key, json, now.to_rfc3339(), revision as i64],
            )?;
            (doc.created_at, doc.created_revision)
        }
        None => {
            conn.execute(
                "INSERT INTO documents
                     (collection, key, body, created_at, updated_at, created_rev, updated_rev)
                 VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?5)",
                params![collection, key, json, now.to_rfc3339(), revision as i64],
            )?;
            (now, revision)
        }
    };

    Ok(Document {
        key: key.to_string(),
        body: body.clone(),
        created_at,
        updated_at: now,
        created_revision,
        revision,
    })
}

/// Map a `rusqlite::Row` to a [`Document`].
fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    let key: String = row.get(0)?;
    let body_str: String = row.get(1)?;
    let created_str: String = row.get(2)?;
    let updated_str: String = row.get(3)?;
    let created_revision: i64 = row.get(4)?;
    let revision: i64 = row.get(5)?;

    let body: Fields = serde_json::from_str(&body_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at = parse_timestamp(2, &created_str)?;
    let updated_at = parse_timestamp(3, &updated_str)?;

    Ok(Document {
        key,
        body,
        created_at,
        updated_at,
        created_revision: created_revision as u64,
        revision: revision as u64,
    })
}

fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}
