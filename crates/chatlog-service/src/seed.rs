//! Demo fixtures and the destructive reseed operation.

use serde::{Deserialize, Serialize};
use tracing::info;

use chatlog_shared::{Call, Chat, Profile};

use crate::calls::CallRepository;
use crate::chats::ChatRepository;
use crate::error::{Result, ServiceError};
use crate::profile::ProfileService;

const FIXTURES_JSON: &str = include_str!("../fixtures/seed.json");

#[derive(Debug, Clone, Deserialize)]
pub struct Fixtures {
    pub chats: Vec<Chat>,
    pub calls: Vec<Call>,
    pub profile: Profile,
}

impl Fixtures {
    /// The fixture set bundled with the crate.
    pub fn bundled() -> Result<Self> {
        serde_json::from_str(FIXTURES_JSON)
            .map_err(|e| ServiceError::Internal(format!("bundled fixtures are malformed: {e}")))
    }
}

/// How many documents a seed run inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedCounts {
    pub chats: usize,
    pub calls: usize,
    pub profile: usize,
}

#[derive(Clone)]
pub struct Seeder {
    chats: ChatRepository,
    calls: CallRepository,
    profile: ProfileService,
}

impl Seeder {
    pub fn new(chats: ChatRepository, calls: CallRepository, profile: ProfileService) -> Self {
        Self {
            chats,
            calls,
            profile,
        }
    }

    /// Clear chats, calls and the profile, then insert the bundled fixtures.
    pub async fn seed(&self) -> Result<SeedCounts> {
        let fixtures = Fixtures::bundled()?;
        self.seed_with(&fixtures).await
    }

    pub async fn seed_with(&self, fixtures: &Fixtures) -> Result<SeedCounts> {
        let removed_chats = self.chats.delete_all().await?;
        let removed_calls = self.calls.delete_all().await?;
        let removed_profiles = self.profile.delete_all().await?;
        info!(
            chats = removed_chats,
            calls = removed_calls,
            profiles = removed_profiles,
            "collections cleared for seeding"
        );

        let counts = SeedCounts {
            chats: self.chats.insert_many(&fixtures.chats).await?,
            calls: self.calls.insert_many(&fixtures.calls).await?,
            profile: {
                self.profile.replace(&fixtures.profile).await?;
                1
            },
        };

        info!(
            chats = counts.chats,
            calls = counts.calls,
            profile = counts.profile,
            "database seeded"
        );
        Ok(counts)
    }

    /// Seed only when there are no chats yet. Returns `None` when the store
    /// already had data.
    pub async fn seed_if_empty(&self) -> Result<Option<SeedCounts>> {
        if !self.chats.find_all().await?.is_empty() {
            return Ok(None);
        }
        self.seed().await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use chatlog_shared::ChatPatch;
    use chatlog_store::{DocumentStore, MemoryStore};

    fn seeder(store: Arc<dyn DocumentStore>) -> (Seeder, ChatRepository) {
        let chats = ChatRepository::new(store.clone());
        let seeder = Seeder::new(
            chats.clone(),
            CallRepository::new(store.clone()),
            ProfileService::new(store),
        );
        (seeder, chats)
    }

    #[test]
    fn bundled_fixtures_parse() {
        let fixtures = Fixtures::bundled().unwrap();
        assert_eq!(fixtures.chats.len(), 5);
        assert_eq!(fixtures.calls.len(), 5);
        assert_eq!(fixtures.profile.user_id, "current-user");
    }

    #[tokio::test]
    async fn seed_replaces_existing_data() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let (seeder, chats) = seeder(store.clone());
        chats
            .upsert(ChatPatch::new("stale").name("Old chat"))
            .await
            .unwrap();

        let counts = seeder.seed().await.unwrap();
        assert_eq!(
            counts,
            SeedCounts {
                chats: 5,
                calls: 5,
                profile: 1
            }
        );

        assert!(chats.find_by_id("stale").await.unwrap().is_none());
        assert_eq!(chats.find_all().await.unwrap().len(), 5);

        // Reseeding is repeatable.
        assert_eq!(seeder.seed().await.unwrap(), counts);
        let profile = ProfileService::new(store).get_or_create().await.unwrap();
        assert_eq!(profile.name, "Demo User");
    }

    #[tokio::test]
    async fn seed_if_empty_skips_populated_store() {
        let (seeder, chats) = seeder(Arc::new(MemoryStore::new()));
        assert!(seeder.seed_if_empty().await.unwrap().is_some());

        chats
            .upsert(ChatPatch::new("6").name("New"))
            .await
            .unwrap();
        assert!(seeder.seed_if_empty().await.unwrap().is_none());
        assert!(chats.find_by_id("6").await.unwrap().is_some());
    }
}
