//! Sign-up, sign-in, and sign-out for editor sessions.

use std::sync::Arc;

use trionforge_domain::Identity;

use crate::infrastructure::ports::{AuthError, IdentityPort};
use crate::use_cases::editor::EditorSession;

pub struct AuthUseCases {
    identity: Arc<dyn IdentityPort>,
}

impl AuthUseCases {
    pub fn new(identity: Arc<dyn IdentityPort>) -> Self {
        Self { identity }
    }

    /// Register an account and attach it to `session`.
    pub async fn sign_up(
        &self,
        session: &mut EditorSession,
        email: &str,
        secret: &str,
    ) -> Result<Identity, AuthError> {
        let identity = self.identity.sign_up(email, secret).await?;
        session.sign_in(identity.clone()).await;
        Ok(identity)
    }

    /// Check credentials and attach the account to `session`.
    ///
    /// On failure the session keeps whatever account it had.
    pub async fn sign_in(
        &self,
        session: &mut EditorSession,
        email: &str,
        secret: &str,
    ) -> Result<Identity, AuthError> {
        let identity = match self.identity.sign_in(email, secret).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::debug!(error = %e, "Sign-in rejected");
                return Err(e);
            }
        };
        session.sign_in(identity.clone()).await;
        Ok(identity)
    }

    pub fn sign_out(&self, session: &mut EditorSession) {
        session.sign_out();
    }
}
