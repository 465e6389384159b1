//! Sign Out
//!
//! Revokes every session for the presenting account. The token itself
//! remains cryptographically valid until its expiry; deleting the session
//! rows is what makes it unusable at the gateway.

use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::application::token::TokenIssuer;
use crate::domain::repository::SessionRepository;
use crate::error::IdentityResult;

/// Sign-out use case (logout everywhere)
pub struct SignOutUseCase<S>
where
    S: SessionRepository,
{
    sessions: Arc<S>,
    issuer: TokenIssuer,
}

impl<S> SignOutUseCase<S>
where
    S: SessionRepository,
{
    pub fn new(sessions: Arc<S>, config: Arc<IdentityConfig>) -> Self {
        Self {
            sessions,
            issuer: TokenIssuer::new(&config),
        }
    }

    /// Verify the presented token and delete all sessions for its account
    pub async fn execute(&self, token: &str) -> IdentityResult<()> {
        let claims = self.issuer.verify(token)?;

        let revoked = self
            .sessions
            .delete_all_for_account(&claims.account_id.into())
            .await?;

        tracing::info!(
            account_id = %claims.account_id,
            revoked,
            "Sign-out revoked sessions"
        );
        Ok(())
    }
}
