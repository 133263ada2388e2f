//! External service ports.

use async_trait::async_trait;
use trionforge_domain::Identity;

use super::error::AuthError;

/// Email + secret account service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityPort: Send + Sync {
    async fn sign_up(&self, email: &str, secret: &str) -> Result<Identity, AuthError>;
    async fn sign_in(&self, email: &str, secret: &str) -> Result<Identity, AuthError>;
}
