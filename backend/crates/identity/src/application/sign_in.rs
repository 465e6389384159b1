//! Sign In
//!
//! Authenticates credentials, mints a signed bearer token, and registers the
//! session row that makes the token revocable. The session insert is awaited
//! before the token is returned, so a token in a client's hands is always
//! backed by a live session.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::IdentityConfig;
use crate::application::token::TokenIssuer;
use crate::domain::entity::{Account, Session};
use crate::domain::repository::{AccountRepository, SessionRepository};
use crate::domain::value_object::Email;
use crate::error::{IdentityError, IdentityResult};

/// Successful sign-in output
pub struct SignInOutput {
    pub token: String,
    pub account: Account,
}

/// Sign-in use case
pub struct SignInUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository,
{
    accounts: Arc<A>,
    sessions: Arc<S>,
    issuer: TokenIssuer,
    config: Arc<IdentityConfig>,
}

impl<A, S> SignInUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository,
{
    pub fn new(accounts: Arc<A>, sessions: Arc<S>, config: Arc<IdentityConfig>) -> Self {
        Self {
            accounts,
            sessions,
            issuer: TokenIssuer::new(&config),
            config,
        }
    }

    /// Authenticate and mint a session-backed token
    ///
    /// Unknown email and wrong password both surface as `InvalidCredentials`;
    /// a locked account is reported distinctly (the caller proved the
    /// credential first, so the lock state is not an information leak).
    pub async fn execute(&self, email: String, password: String) -> IdentityResult<SignInOutput> {
        let email = Email::new(email)?;

        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        let supplied = ClearTextPassword::new_unchecked(password);
        if !account.credential_hash.verify(&supplied, self.config.pepper()) {
            return Err(IdentityError::InvalidCredentials);
        }

        if !account.can_authenticate() {
            return Err(IdentityError::AccountLocked);
        }

        let token = self
            .issuer
            .issue(account.account_id.into_uuid(), account.email.as_str(), account.role)?;

        let session = Session::new(account.account_id, token.clone(), self.config.session_ttl_chrono());
        self.sessions.create(&session).await?;

        // Bookkeeping only; a failure here must not fail the login
        if let Err(e) = self.accounts.record_authentication(&account.account_id).await {
            tracing::warn!(account_id = %account.account_id, error = %e, "Failed to stamp last authentication");
        }

        tracing::info!(
            account_id = %account.account_id,
            session_id = %session.session_id,
            "Sign-in succeeded"
        );

        Ok(SignInOutput { token, account })
    }
}
