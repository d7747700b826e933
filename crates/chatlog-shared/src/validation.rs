//! Input validation applied at the service boundary.
//!
//! Every check here is pure and runs before any storage call, so a rejected
//! request never leaves a partial write behind.

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::models::{ChatPatch, Message, ProfilePatch};

fn require_non_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

pub fn validate_chat_id(id: &str) -> Result<(), ValidationError> {
    require_non_blank("chat id", id)
}

/// Message text must contain something other than whitespace.
pub fn validate_message_text(text: &str) -> Result<(), ValidationError> {
    require_non_blank("message text", text)
}

pub fn validate_message(message: &Message) -> Result<(), ValidationError> {
    require_non_blank("message id", &message.id)?;
    validate_message_text(&message.text)
}

/// Checks every message of a full log and rejects repeated ids.
pub fn validate_messages(messages: &[Message]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(messages.len());
    for message in messages {
        validate_message(message)?;
        if !seen.insert(message.id.as_str()) {
            return Err(ValidationError::DuplicateMessageId(message.id.clone()));
        }
    }
    Ok(())
}

pub fn validate_chat_patch(patch: &ChatPatch) -> Result<(), ValidationError> {
    validate_chat_id(&patch.id)?;
    if let Some(name) = &patch.name {
        require_non_blank("chat name", name)?;
    }
    if let Some(messages) = &patch.messages {
        validate_messages(messages)?;
    }
    Ok(())
}

pub fn validate_profile_patch(patch: &ProfilePatch) -> Result<(), ValidationError> {
    if let Some(name) = &patch.name {
        require_non_blank("profile name", name)?;
    }
    if let Some(phone) = &patch.phone {
        require_non_blank("profile phone", phone)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sender;

    fn msg(id: &str, text: &str) -> Message {
        Message {
            id: id.into(),
            text: text.into(),
            time: "10:00".into(),
            sender: Sender::Me,
        }
    }

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(
            validate_message_text("   \n\t"),
            Err(ValidationError::Empty {
                field: "message text"
            })
        );
        assert!(validate_message_text(" hi ").is_ok());
    }

    #[test]
    fn duplicate_ids_in_log_are_rejected() {
        let log = vec![msg("1", "a"), msg("2", "b"), msg("1", "c")];
        assert_eq!(
            validate_messages(&log),
            Err(ValidationError::DuplicateMessageId("1".into()))
        );
    }

    #[test]
    fn chat_patch_requires_id_and_non_blank_name() {
        assert!(validate_chat_patch(&ChatPatch::new(" ")).is_err());
        assert!(validate_chat_patch(&ChatPatch::new("1").name("")).is_err());
        assert!(validate_chat_patch(&ChatPatch::new("1").name("Mom")).is_ok());
    }

    #[test]
    fn profile_patch_allows_partial_updates() {
        let patch = ProfilePatch {
            about: Some("busy".into()),
            ..Default::default()
        };
        assert!(validate_profile_patch(&patch).is_ok());

        let patch = ProfilePatch {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(validate_profile_patch(&patch).is_err());
    }
}
