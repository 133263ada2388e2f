//! In-memory profile and character storage.
//!
//! Used when no database path is configured, and by tests.

use async_trait::async_trait;
use dashmap::DashMap;
use trionforge_domain::{CharacterId, CharacterRecord, UserId};

use crate::infrastructure::ports::{CharacterRepo, ProfileMetadata, ProfileRepo, RepoError};

#[derive(Default)]
pub struct InMemoryProfileRepo {
    profiles: DashMap<UserId, ProfileMetadata>,
}

impl InMemoryProfileRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepo for InMemoryProfileRepo {
    async fn read_metadata(&self, user_id: UserId) -> Result<ProfileMetadata, RepoError> {
        Ok(self
            .profiles
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn write_metadata(
        &self,
        user_id: UserId,
        patch: ProfileMetadata,
    ) -> Result<(), RepoError> {
        let mut entry = self.profiles.entry(user_id).or_default();
        for (key, value) in patch {
            entry.insert(key, value);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCharacterRepo {
    records: DashMap<CharacterId, CharacterRecord>,
}

impl InMemoryCharacterRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CharacterRepo for InMemoryCharacterRepo {
    async fn list(&self, user_id: UserId) -> Result<Vec<CharacterRecord>, RepoError> {
        let mut records: Vec<CharacterRecord> = self
            .records
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    async fn get(&self, id: CharacterId) -> Result<Option<CharacterRecord>, RepoError> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    async fn upsert(&self, record: &CharacterRecord) -> Result<(), RepoError> {
        self.records.insert(record.id, record.clone());
        Ok(())
    }

    async fn delete(&self, id: CharacterId) -> Result<(), RepoError> {
        self.records.remove(&id);
        Ok(())
    }
}
