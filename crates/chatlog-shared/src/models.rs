//! Domain models persisted in the document store.
//!
//! Every struct derives `Serialize` and `Deserialize` with camelCase field
//! names so that the stored documents and the HTTP payloads share one shape.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_PROFILE_ABOUT, DEFAULT_PROFILE_AVATAR, DEFAULT_PROFILE_NAME, DEFAULT_PROFILE_PHONE,
    PROFILE_USER_ID,
};
use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Who wrote a message, from the point of view of the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Me,
    Them,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Me => "me",
            Self::Them => "them",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "me" => Ok(Self::Me),
            "them" => Ok(Self::Them),
            other => Err(ValidationError::InvalidSender(other.to_string())),
        }
    }
}

/// A single chat message. Ordering inside a chat is the append order; `time`
/// is a display string and is never parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Message {
    /// Unique within the parent chat only.
    pub id: String,
    pub text: String,
    pub time: String,
    pub sender: Sender,
}

/// A message as submitted by a client. The id doubles as an idempotency key
/// and is generated server-side when absent.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NewMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub time: Option<String>,
    pub sender: String,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A conversation with its full message log and a denormalized summary of
/// the most recent message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    /// Text of the last message in `messages`.
    #[serde(default)]
    pub last_message: String,
    /// Time of the last message in `messages`.
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub unread: u32,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Chat {
    /// Whether the summary fields mirror the last message.
    ///
    /// A chat without messages is considered consistent whatever its summary
    /// says, since fixtures and upserts may carry a free-form preview.
    pub fn summary_is_consistent(&self) -> bool {
        match self.messages.last() {
            Some(last) => self.last_message == last.text && self.time == last.time,
            None => true,
        }
    }
}

/// Fields accepted by the chat upsert. Only `id` is mandatory; absent fields
/// keep their stored value (or the creation default for a new chat).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChatPatch {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
}

impl ChatPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    pub fn unread(mut self, unread: u32) -> Self {
        self.unread = Some(unread);
        self
    }

    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }
}

// ---------------------------------------------------------------------------
// Call
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Incoming,
    Outgoing,
    Missed,
}

/// An entry of the call history. Unrelated to chats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub id: String,
    pub name: String,
    pub avatar: String,
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub time: String,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// The local user's profile. There is exactly one, keyed by
/// [`PROFILE_USER_ID`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub name: String,
    pub about: String,
    pub avatar: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            user_id: PROFILE_USER_ID.to_string(),
            name: DEFAULT_PROFILE_NAME.to_string(),
            about: DEFAULT_PROFILE_ABOUT.to_string(),
            avatar: DEFAULT_PROFILE_AVATAR.to_string(),
            phone: DEFAULT_PROFILE_PHONE.to_string(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.about.is_none() && self.avatar.is_none() && self.phone.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_parses_closed_set() {
        assert_eq!("me".parse::<Sender>().unwrap(), Sender::Me);
        assert_eq!("them".parse::<Sender>().unwrap(), Sender::Them);
        assert_eq!(
            "Me".parse::<Sender>(),
            Err(ValidationError::InvalidSender("Me".into()))
        );
    }

    #[test]
    fn chat_uses_camel_case_and_skips_missing_timestamps() {
        let chat = Chat {
            id: "1".into(),
            name: "Mom".into(),
            avatar: "👩".into(),
            last_message: "hi".into(),
            time: "10:00".into(),
            unread: 2,
            messages: vec![Message {
                id: "1".into(),
                text: "hi".into(),
                time: "10:00".into(),
                sender: Sender::Them,
            }],
            created_at: None,
            updated_at: None,
        };

        let value = serde_json::to_value(&chat).unwrap();
        assert_eq!(value["lastMessage"], "hi");
        assert_eq!(value["messages"][0]["sender"], "them");
        assert!(value.get("createdAt").is_none());
        assert!(chat.summary_is_consistent());
    }

    #[test]
    fn chat_patch_rejects_unknown_fields() {
        let err = serde_json::from_str::<ChatPatch>(r#"{"id":"1","colour":"red"}"#);
        assert!(err.is_err());

        let patch: ChatPatch = serde_json::from_str(r#"{"id":"1","name":"Mom"}"#).unwrap();
        assert_eq!(patch, ChatPatch::new("1").name("Mom"));
    }

    #[test]
    fn chat_patch_serializes_only_present_fields() {
        let value = serde_json::to_value(ChatPatch::new("7").unread(3)).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["unread"], 3);
    }

    #[test]
    fn negative_unread_is_rejected() {
        assert!(serde_json::from_str::<ChatPatch>(r#"{"id":"1","unread":-1}"#).is_err());
    }

    #[test]
    fn call_type_field_is_named_type() {
        let call: Call = serde_json::from_str(
            r#"{"id":"1","name":"Mom","avatar":"👩","type":"missed","time":"Yesterday"}"#,
        )
        .unwrap();
        assert_eq!(call.call_type, CallType::Missed);
        assert!(!call.is_video);
    }

    #[test]
    fn unknown_call_type_is_rejected() {
        let err = serde_json::from_str::<Call>(
            r#"{"id":"1","name":"Mom","avatar":"👩","type":"voicemail","time":"Yesterday"}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn default_profile_matches_documented_literals() {
        let profile = Profile::default();
        assert_eq!(profile.user_id, "current-user");
        assert_eq!(profile.name, "Your Name");
        assert_eq!(profile.about, "Hey there! I am using WhatsApp.");
        assert_eq!(profile.avatar, "😊");
        assert_eq!(profile.phone, "+1 234 567 8900");
    }
}
