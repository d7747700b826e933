//! Message append service.
//!
//! Validates outgoing messages, assigns ids and hands the append to the
//! [`ChatRepository`]. Each call performs at most one persisted append and
//! never retries a storage failure: a blind retry could store the message
//! twice. Clients that need at-most-once delivery supply their own message id,
//! which the repository deduplicates.

use tracing::{info, warn};
use uuid::Uuid;

use chatlog_shared::validation::{validate_chat_id, validate_message_text};
use chatlog_shared::{Chat, Message, NewMessage, Sender, ValidationError};

use crate::chats::ChatRepository;
use crate::error::{Result, ServiceError};

/// Fresh ids drawn before giving up on a chat whose log keeps colliding.
const MAX_ID_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct MessageService {
    chats: ChatRepository,
    next_id: fn() -> String,
}

impl MessageService {
    pub fn new(chats: ChatRepository) -> Self {
        Self::with_id_source(chats, random_message_id)
    }

    /// Use `next_id` instead of random UUIDs for server-assigned message ids.
    pub fn with_id_source(chats: ChatRepository, next_id: fn() -> String) -> Self {
        Self { chats, next_id }
    }

    /// Append a new message with a server-assigned id and return it.
    ///
    /// An empty `client_time` is replaced by the server's local `H:MM`.
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        sender: Sender,
        client_time: &str,
    ) -> Result<Message> {
        validate_chat_id(chat_id)?;
        validate_message_text(text)?;

        let (message, _) = self
            .append_with_fresh_id(chat_id, text, sender, display_time(client_time))
            .await?;
        Ok(message)
    }

    /// Append a client-submitted message and return the updated chat.
    ///
    /// When the client supplies an id it is used as an idempotency key: a
    /// resend of the same id leaves the chat unchanged.
    pub async fn append(&self, chat_id: &str, new: NewMessage) -> Result<Chat> {
        validate_chat_id(chat_id)?;
        validate_message_text(&new.text)?;
        let sender: Sender = new.sender.parse()?;
        let time = display_time(new.time.as_deref().unwrap_or_default());

        let Some(id) = new.id else {
            let (_, chat) = self
                .append_with_fresh_id(chat_id, &new.text, sender, time)
                .await?;
            return Ok(chat);
        };

        if id.trim().is_empty() {
            return Err(ValidationError::Empty { field: "message id" }.into());
        }

        let message = Message {
            id,
            text: new.text,
            time,
            sender,
        };
        let message_id = message.id.clone();
        let appended = self.chats.append_message(chat_id, message).await?;

        if appended.duplicate {
            info!(chat_id, message_id = %message_id, "duplicate message ignored");
        } else {
            info!(chat_id, message_id = %message_id, sender = %sender, "message appended");
        }
        Ok(appended.chat)
    }

    async fn append_with_fresh_id(
        &self,
        chat_id: &str,
        text: &str,
        sender: Sender,
        time: String,
    ) -> Result<(Message, Chat)> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let message = Message {
                id: (self.next_id)(),
                text: text.to_string(),
                time: time.clone(),
                sender,
            };

            let appended = self.chats.append_message(chat_id, message.clone()).await?;
            if !appended.duplicate {
                info!(chat_id, message_id = %message.id, sender = %sender, "message appended");
                return Ok((message, appended.chat));
            }
            warn!(
                chat_id,
                message_id = %message.id,
                "generated message id collided, drawing another"
            );
        }

        Err(ServiceError::Conflict(format!(
            "could not allocate a unique message id in chat '{chat_id}'"
        )))
    }
}

fn random_message_id() -> String {
    Uuid::new_v4().to_string()
}

fn display_time(client_time: &str) -> String {
    let trimmed = client_time.trim();
    if trimmed.is_empty() {
        chrono::Local::now().format("%-H:%M").to_string()
    } else {
        trimmed.to_string()
    }
}
