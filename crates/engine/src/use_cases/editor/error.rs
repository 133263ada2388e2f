//! Editor session errors.

use crate::infrastructure::ports::RepoError;
use trionforge_domain::{CharacterId, DomainError, FieldPath, ViolationSet};

/// Errors that can occur while editing, saving, or loading characters.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Sign in required")]
    NotSignedIn,
    #[error("VIP mode is not available for this account")]
    NotVipEligible,
    #[error("Field {0} cannot be edited in standard mode")]
    FieldLocked(FieldPath),
    #[error("Character cannot be saved: {0}")]
    Invalid(ViolationSet),
    #[error("Character not found: {0}")]
    CharacterNotFound(CharacterId),
    #[error("Invalid update: {0}")]
    Domain(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}
