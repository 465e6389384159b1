//! Email Change Flow
//!
//! Authenticated two-step flow keyed by the acting account's id, not the
//! email: `start` challenges the *new* address (proof of control), `verify`
//! consumes the code and commits the change. The current email keeps
//! working until verification completes.

use std::sync::Arc;

use kernel::id::AccountId;
use platform::crypto::numeric_code;
use serde::{Deserialize, Serialize};

use crate::application::config::IdentityConfig;
use crate::domain::entity::{VerificationEntry, VerificationPurpose};
use crate::domain::repository::{AccountRepository, CodeCheck, CodeDelivery, VerificationStore};
use crate::domain::value_object::Email;
use crate::error::{IdentityError, IdentityResult};

/// Pending payload: the address waiting to be proven
#[derive(Debug, Serialize, Deserialize)]
struct PendingEmailChange {
    new_email: String,
}

/// Email change use case
pub struct EmailChangeUseCase<A, V, D>
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

impl<A, V, D> EmailChangeUseCase<A, V, D>
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

    /// Challenge the new address on behalf of the acting account
    pub async fn start(&self, actor_id: &AccountId, new_email: String) -> IdentityResult<()> {
        let new_email = Email::new(new_email)?;

        // The new address must not belong to a different account. The same
        // account re-requesting its current address is a no-op challenge,
        // not a conflict.
        if let Some(existing) = self.accounts.find_by_email(&new_email).await? {
            if existing.account_id != *actor_id {
                return Err(IdentityError::EmailTaken);
            }
        }

        let code = numeric_code(self.config.code_length);

        let payload = serde_json::to_value(PendingEmailChange {
            new_email: new_email.as_str().to_string(),
        })
        .map_err(|e| IdentityError::Internal(e.to_string()))?;

        // Keyed by account id so a second start overwrites the first
        let entry = VerificationEntry::new(
            VerificationPurpose::ChangeEmail,
            actor_id.to_string(),
            code.clone(),
            Some(payload),
            self.config.code_ttl(VerificationPurpose::ChangeEmail),
        );
        self.verifications.put(&entry).await?;

        // Delivered to the address being proven, not the current one
        if let Err(e) = self
            .delivery
            .deliver(&new_email, VerificationPurpose::ChangeEmail, &code)
            .await
        {
            tracing::warn!(account_id = %actor_id, error = %e, "Email change code delivery failed");
        }

        tracing::info!(account_id = %actor_id, "Email change challenge issued");
        Ok(())
    }

    /// Consume the code and commit the email change
    pub async fn verify(&self, actor_id: &AccountId, code: String) -> IdentityResult<Email> {
        let entry = match self
            .verifications
            .check(VerificationPurpose::ChangeEmail, &actor_id.to_string(), &code)
            .await?
        {
            CodeCheck::Consumed(entry) => entry,
            CodeCheck::Miss => return Err(IdentityError::CodeMissing),
            CodeCheck::Mismatch => return Err(IdentityError::CodeMismatch),
        };

        let pending: PendingEmailChange = entry
            .payload
            .ok_or_else(|| IdentityError::Internal("Email change entry lost its payload".into()))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| IdentityError::Internal(e.to_string()))
            })?;

        let new_email = Email::from_db(pending.new_email);

        // The address may have been claimed between start and verify
        if let Some(existing) = self.accounts.find_by_email(&new_email).await? {
            if existing.account_id != *actor_id {
                return Err(IdentityError::EmailTaken);
            }
        }

        self.accounts.update_email(actor_id, &new_email).await?;

        tracing::info!(account_id = %actor_id, "Email change committed");
        Ok(new_email)
    }
}
