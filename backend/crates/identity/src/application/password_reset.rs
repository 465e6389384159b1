//! Password Reset Flow
//!
//! Unauthenticated recovery path: `start` challenges the account's email
//! with a short-lived code, `confirm` trades the code for a credential
//! replacement. Existing sessions are left alone; the owner regaining
//! control can sign in and revoke them explicitly.

use std::sync::Arc;

use platform::crypto::numeric_code;
use platform::password::ClearTextPassword;

use crate::application::config::IdentityConfig;
use crate::domain::entity::{VerificationEntry, VerificationPurpose};
use crate::domain::repository::{AccountRepository, CodeCheck, CodeDelivery, VerificationStore};
use crate::domain::value_object::Email;
use crate::error::{IdentityError, IdentityResult};

/// Password reset use case
pub struct PasswordResetUseCase<A, V, D>
where
    A: AccountRepository,
    V: VerificationStore,
    D: CodeDelivery,
{
    accounts: Arc<A>,
    verifications: Arc<V>,
    delivery: Arc<D>,
    config: Arc<IdentityConfig>,
}

impl<A, V, D> PasswordResetUseCase<A, V, D>
where
    A: AccountRepository,
    V: VerificationStore,
    D: CodeDelivery,
{
    pub fn new(
        accounts: Arc<A>,
        verifications: Arc<V>,
        delivery: Arc<D>,
        config: Arc<IdentityConfig>,
    ) -> Self {
        Self {
            accounts,
            verifications,
            delivery,
            config,
        }
    }

    /// Issue a reset challenge for the account behind the email
    ///
    /// An unknown email is reported as not-found. That reveals account
    /// existence; acceptable here because registration's duplicate check
    /// already does.
    pub async fn start(&self, email: String) -> IdentityResult<()> {
        let email = Email::new(email)?;

        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(IdentityError::AccountNotFound)?;

        let code = numeric_code(self.config.code_length);

        let entry = VerificationEntry::new(
            VerificationPurpose::ResetPassword,
            email.as_str().to_string(),
            code.clone(),
            None,
            self.config.code_ttl(VerificationPurpose::ResetPassword),
        );
        self.verifications.put(&entry).await?;

        if let Err(e) = self
            .delivery
            .deliver(&email, VerificationPurpose::ResetPassword, &code)
            .await
        {
            tracing::warn!(email = %email, error = %e, "Reset code delivery failed");
        }

        tracing::info!(account_id = %account.account_id, "Password reset challenge issued");
        Ok(())
    }

    /// Trade a valid code for a credential replacement
    ///
    /// The new password is validated before the code is checked, so a policy
    /// rejection never burns the one-time code.
    pub async fn confirm(
        &self,
        email: String,
        code: String,
        new_password: String,
    ) -> IdentityResult<()> {
        let email = Email::new(email)?;

        let password = ClearTextPassword::new(new_password)
            .map_err(|e| IdentityError::Validation(e.to_string()))?;
        let credential_hash = password
            .hash(self.config.pepper())
            .map_err(|e| IdentityError::Internal(e.to_string()))?;

        match self
            .verifications
            .check(VerificationPurpose::ResetPassword, email.as_str(), &code)
            .await?
        {
            CodeCheck::Consumed(_) => {}
            CodeCheck::Miss => return Err(IdentityError::CodeMissing),
            CodeCheck::Mismatch => return Err(IdentityError::CodeMismatch),
        }

        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(IdentityError::AccountNotFound)?;

        self.accounts
            .update_credential(&account.account_id, &credential_hash)
            .await?;

        tracing::info!(account_id = %account.account_id, "Credential replaced via reset");
        Ok(())
    }
}
