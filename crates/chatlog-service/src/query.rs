//! Read side for chats.

use chatlog_shared::Chat;

use crate::chats::ChatRepository;
use crate::error::{Result, ServiceError};

#[derive(Clone)]
pub struct ChatQueryService {
    chats: ChatRepository,
}

impl ChatQueryService {
    pub fn new(chats: ChatRepository) -> Self {
        Self { chats }
    }

    /// Chats by recency, optionally narrowed to names containing `filter`
    /// (case-insensitive). An empty filter matches everything.
    pub async fn list_chats(&self, filter: Option<&str>) -> Result<Vec<Chat>> {
        let chats = self.chats.find_all().await?;
        Ok(match filter {
            Some(filter) => filter_by_name(chats, filter),
            None => chats,
        })
    }

    pub async fn get_chat(&self, id: &str) -> Result<Chat> {
        self.chats
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::chat_not_found(id))
    }
}

/// Keep the chats whose name contains `filter`, ignoring case. Order is
/// preserved.
pub fn filter_by_name(chats: Vec<Chat>, filter: &str) -> Vec<Chat> {
    let needle = filter.to_lowercase();
    if needle.is_empty() {
        return chats;
    }
    chats
        .into_iter()
        .filter(|chat| chat.name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use chatlog_shared::ChatPatch;
    use chatlog_store::MemoryStore;

    async fn seeded() -> ChatQueryService {
        let repo = ChatRepository::new(Arc::new(MemoryStore::new()));
        for (id, name) in [("1", "Mom"), ("2", "Work Team"), ("3", "Coffee Lovers")] {
            repo.upsert(ChatPatch::new(id).name(name)).await.unwrap();
        }
        ChatQueryService::new(repo)
    }

    fn names(chats: &[Chat]) -> Vec<&str> {
        chats.iter().map(|c| c.name.as_str()).collect()
    }

    #[tokio::test]
    async fn no_filter_and_empty_filter_return_everything() {
        let service = seeded().await;
        let all = service.list_chats(None).await.unwrap();
        let empty = service.list_chats(Some("")).await.unwrap();

        assert_eq!(names(&all), ["Coffee Lovers", "Work Team", "Mom"]);
        assert_eq!(names(&all), names(&empty));
    }

    #[tokio::test]
    async fn filter_is_case_insensitive_substring() {
        let service = seeded().await;
        let chats = service.list_chats(Some("TEAM")).await.unwrap();
        assert_eq!(names(&chats), ["Work Team"]);

        let chats = service.list_chats(Some("o")).await.unwrap();
        assert_eq!(names(&chats), ["Coffee Lovers", "Work Team", "Mom"]);
    }

    #[tokio::test]
    async fn get_chat_reports_missing() {
        let service = seeded().await;
        assert_eq!(service.get_chat("2").await.unwrap().name, "Work Team");
        assert!(matches!(
            service.get_chat("42").await,
            Err(ServiceError::NotFound { .. })
        ));
    }
}
