//! Repository port traits.

use async_trait::async_trait;
use trionforge_domain::{CharacterId, CharacterRecord, UserId};

use super::error::RepoError;

/// Free-form per-account metadata, as a JSON object.
pub type ProfileMetadata = serde_json::Map<String, serde_json::Value>;

/// Account profile storage.
///
/// Limits live under `maxStatTotal` / `fixedTrion` next to whatever else the
/// account carries, so writes merge instead of replacing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepo: Send + Sync {
    /// Metadata for the account; empty if the account has none yet.
    async fn read_metadata(&self, user_id: UserId) -> Result<ProfileMetadata, RepoError>;

    /// Merge `patch` into the stored metadata. Keys absent from `patch` are kept.
    async fn write_metadata(&self, user_id: UserId, patch: ProfileMetadata)
        -> Result<(), RepoError>;
}

/// Saved character storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterRepo: Send + Sync {
    /// All records owned by `user_id`, most recently updated first.
    async fn list(&self, user_id: UserId) -> Result<Vec<CharacterRecord>, RepoError>;

    async fn get(&self, id: CharacterId) -> Result<Option<CharacterRecord>, RepoError>;

    /// Insert or replace by id.
    async fn upsert(&self, record: &CharacterRecord) -> Result<(), RepoError>;

    /// Deleting a missing id is not an error.
    async fn delete(&self, id: CharacterId) -> Result<(), RepoError>;
}
