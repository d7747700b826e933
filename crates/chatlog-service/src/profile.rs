//! The singleton profile of the local user.

use std::sync::Arc;

use tracing::info;

use chatlog_shared::constants::{PROFILES_COLLECTION, PROFILE_USER_ID};
use chatlog_shared::validation::validate_profile_patch;
use chatlog_shared::{Profile, ProfilePatch};
use chatlog_store::{DocumentStore, WriteOutcome};

use crate::codec::{from_document, to_fields};
use crate::error::Result;

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Return the profile, creating it with the default values on first use.
    /// Concurrent first calls still produce a single profile.
    pub async fn get_or_create(&self) -> Result<Profile> {
        let merged = self
            .store
            .insert_if_absent(PROFILES_COLLECTION, PROFILE_USER_ID, to_fields(&Profile::default())?)
            .await?;

        if merged.outcome == WriteOutcome::Created {
            info!(user_id = PROFILE_USER_ID, "default profile created");
        }
        from_document(&merged.document)
    }

    /// Merge the provided fields into the profile. A missing profile is
    /// created from the defaults first.
    pub async fn update(&self, patch: ProfilePatch) -> Result<Profile> {
        validate_profile_patch(&patch)?;
        if patch.is_empty() {
            return self.get_or_create().await;
        }

        let merged = self
            .store
            .merge(
                PROFILES_COLLECTION,
                PROFILE_USER_ID,
                to_fields(&patch)?,
                to_fields(&Profile::default())?,
            )
            .await?;

        info!(user_id = PROFILE_USER_ID, outcome = ?merged.outcome, "profile updated");
        from_document(&merged.document)
    }

    /// Overwrite the stored profile wholesale. Used by fixture seeding.
    pub async fn replace(&self, profile: &Profile) -> Result<Profile> {
        let doc = self
            .store
            .upsert(PROFILES_COLLECTION, &profile.user_id, to_fields(profile)?)
            .await?;
        from_document(&doc)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        Ok(self.store.delete_all(PROFILES_COLLECTION).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatlog_store::{MemoryStore, SortOrder};

    #[tokio::test]
    async fn get_or_create_twice_stores_one_default_profile() {
        let store = Arc::new(MemoryStore::new());
        let service = ProfileService::new(store.clone());

        let first = service.get_or_create().await.unwrap();
        let second = service.get_or_create().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.name, "Your Name");
        assert_eq!(first.about, "Hey there! I am using WhatsApp.");
        assert_eq!(first.avatar, "😊");
        assert_eq!(first.phone, "+1 234 567 8900");

        let stored = store
            .list(PROFILES_COLLECTION, SortOrder::RecentlyCreated)
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_reads_create_once() {
        let store = Arc::new(MemoryStore::new());
        let service = ProfileService::new(store.clone());

        let tasks = (0..8).map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.get_or_create().await })
        });
        let profiles: Vec<Profile> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        assert!(profiles.windows(2).all(|w| w[0].created_at == w[1].created_at));
        let stored = store
            .list(PROFILES_COLLECTION, SortOrder::RecentlyCreated)
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn update_merges_only_given_fields() {
        let service = ProfileService::new(Arc::new(MemoryStore::new()));
        service.get_or_create().await.unwrap();

        let updated = service
            .update(ProfilePatch {
                about: Some("At the gym".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.about, "At the gym");
        assert_eq!(updated.name, "Your Name");
        assert_eq!(updated.phone, "+1 234 567 8900");
    }

    #[tokio::test]
    async fn update_without_profile_starts_from_defaults() {
        let service = ProfileService::new(Arc::new(MemoryStore::new()));
        let updated = service
            .update(ProfilePatch {
                name: Some("Ravi".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.name, "Ravi");
        assert_eq!(updated.user_id, PROFILE_USER_ID);
        assert_eq!(updated.avatar, "😊");
    }
}
