//! In-process identity service.
//!
//! Accounts live for the lifetime of the process. Secrets are stored as
//! salted SHA-256 digests; emails are matched case-insensitively.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use trionforge_domain::{normalize_email, Identity, UserId};
use uuid::Uuid;

use crate::infrastructure::ports::{AuthError, IdentityPort};

struct Account {
    id: UserId,
    email: String,
    salt: String,
    digest: String,
}

#[derive(Default)]
pub struct InMemoryIdentity {
    accounts: DashMap<String, Account>,
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }
}

fn account_key(email: &str) -> Result<String, AuthError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AuthError::EmptyEmail);
    }
    Ok(email)
}

fn digest(salt: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl IdentityPort for InMemoryIdentity {
    async fn sign_up(&self, email: &str, secret: &str) -> Result<Identity, AuthError> {
        let email = account_key(email)?;
        if secret.is_empty() {
            return Err(AuthError::EmptySecret);
        }

        match self.accounts.entry(email.clone()) {
            Entry::Occupied(_) => Err(AuthError::AlreadyRegistered(email)),
            Entry::Vacant(slot) => {
                let salt = Uuid::new_v4().simple().to_string();
                let account = Account {
                    id: UserId::new(),
                    email: email.clone(),
                    digest: digest(&salt, secret),
                    salt,
                };
                let identity = Identity::new(account.id, account.email.clone());
                slot.insert(account);
                tracing::info!(user_id = %identity.id, "Account registered");
                Ok(identity)
            }
        }
    }

    async fn sign_in(&self, email: &str, secret: &str) -> Result<Identity, AuthError> {
        let email = account_key(email)?;
        let account = self
            .accounts
            .get(&email)
            .ok_or(AuthError::InvalidCredentials)?;

        if digest(&account.salt, secret) != account.digest {
            tracing::debug!(user_id = %account.id, "Rejected sign-in with wrong secret");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(Identity::new(account.id, account.email.clone()))
    }
}
