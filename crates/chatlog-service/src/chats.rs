//! Chat repository: owns chat documents and the append-only message log.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use chatlog_shared::constants::CHATS_COLLECTION;
use chatlog_shared::validation::validate_chat_patch;
use chatlog_shared::{Chat, ChatPatch, Message};
use chatlog_store::{AppendOutcome, ArrayAppend, DocumentStore, Fields, SortOrder, WriteOutcome};

use crate::codec::{from_document, to_fields};
use crate::error::{Result, ServiceError};

/// Result of [`ChatRepository::append_message`].
#[derive(Debug, Clone)]
pub struct AppendedMessage {
    /// The chat as stored after the call.
    pub chat: Chat,
    /// `true` when a message with the same id was already in the chat and
    /// nothing was written.
    pub duplicate: bool,
}

#[derive(Clone)]
pub struct ChatRepository {
    store: Arc<dyn DocumentStore>,
}

impl ChatRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All chats, most recently updated first.
    pub async fn find_all(&self) -> Result<Vec<Chat>> {
        self.store
            .list(CHATS_COLLECTION, SortOrder::RecentlyUpdated)
            .await?
            .iter()
            .map(from_document::<Chat>)
            .collect()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Chat>> {
        match self.store.get(CHATS_COLLECTION, id).await? {
            Some(doc) => Ok(Some(from_document(&doc)?)),
            None => Ok(None),
        }
    }

    /// Create the chat if `patch.id` is new, otherwise replace the fields
    /// the patch carries. Both branches run as one atomic store call.
    pub async fn upsert(&self, patch: ChatPatch) -> Result<Chat> {
        validate_chat_patch(&patch)?;
        let patch = with_derived_summary(patch);

        let fields = to_fields(&patch)?;
        let merged = self
            .store
            .merge(CHATS_COLLECTION, &patch.id, fields, creation_defaults(&patch.id))
            .await?;

        match merged.outcome {
            WriteOutcome::Created => info!(chat_id = %patch.id, "chat created"),
            _ => debug!(chat_id = %patch.id, "chat updated"),
        }

        from_document(&merged.document)
    }

    /// Append `message` and refresh `lastMessage`/`time` in the same atomic
    /// write. Re-appending an id already present is a no-op.
    pub async fn append_message(&self, chat_id: &str, message: Message) -> Result<AppendedMessage> {
        let item = serde_json::to_value(&message)
            .map_err(|e| ServiceError::Internal(format!("encoding message failed: {e}")))?;
        let op = ArrayAppend::new("messages", item)
            .dedup_on("id")
            .set("lastMessage", message.text.as_str())
            .set("time", message.time.as_str());

        let appended = self
            .store
            .append_to_array_field(CHATS_COLLECTION, chat_id, op)
            .await?
            .ok_or_else(|| ServiceError::chat_not_found(chat_id))?;

        Ok(AppendedMessage {
            chat: from_document(&appended.document)?,
            duplicate: appended.outcome == AppendOutcome::Duplicate,
        })
    }

    /// Bulk insert of complete chats, used by fixture seeding.
    pub async fn insert_many(&self, chats: &[Chat]) -> Result<usize> {
        let docs = chats
            .iter()
            .map(|chat| -> Result<(String, Fields)> { Ok((chat.id.clone(), to_fields(chat)?)) })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.store.insert_many(CHATS_COLLECTION, docs).await?)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        Ok(self.store.delete_all(CHATS_COLLECTION).await?)
    }
}

/// Field values of a chat created by an upsert that does not provide them.
fn creation_defaults(id: &str) -> Fields {
    [
        ("id", json!(id)),
        ("name", json!("")),
        ("avatar", json!("")),
        ("lastMessage", json!("")),
        ("time", json!("")),
        ("unread", json!(0)),
        ("messages", json!([])),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}

/// Fill `lastMessage`/`time` from the last message of a supplied log when
/// the patch leaves them out.
fn with_derived_summary(mut patch: ChatPatch) -> ChatPatch {
    if let Some(last) = patch.messages.as_ref().and_then(|m| m.last()) {
        if patch.last_message.is_none() {
            patch.last_message = Some(last.text.clone());
        }
        if patch.time.is_none() {
            patch.time = Some(last.time.clone());
        }
    }
    patch
}
