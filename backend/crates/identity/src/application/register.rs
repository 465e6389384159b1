//! Registration Flow
//!
//! Two-step flow: `start` issues a one-time-code challenge and parks the
//! hashed credential + profile as a pending payload; `verify` consumes the
//! challenge and creates the Account. No Account ever exists before a
//! successful verification, so an undelivered code leaves only a
//! recoverable, overwritable cache entry.

use std::sync::Arc;

use platform::crypto::numeric_code;
use platform::password::{ClearTextPassword, HashedPassword};
use serde::{Deserialize, Serialize};

use crate::application::config::IdentityConfig;
use crate::domain::entity::{Account, VerificationEntry, VerificationPurpose};
use crate::domain::repository::{AccountRepository, CodeCheck, CodeDelivery, VerificationStore};
use crate::domain::value_object::Email;
use crate::error::{IdentityError, IdentityResult};

/// Registration start input
pub struct StartRegistrationInput {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub phone: Option<String>,
}

/// Pending payload parked in the verification store until the code is
/// confirmed
#[derive(Debug, Serialize, Deserialize)]
struct PendingRegistration {
    credential_hash: String,
    display_name: String,
    phone: Option<String>,
}

/// Registration use case
pub struct RegisterUseCase<A, V, D>
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

impl<A, V, D> RegisterUseCase<A, V, D>
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

    /// Start registration: validate, hash, park, deliver
    ///
    /// Overwrites any prior challenge for the same email (last writer wins;
    /// re-requesting a code intentionally invalidates the earlier one).
    pub async fn start(&self, input: StartRegistrationInput) -> IdentityResult<()> {
        let email = Email::new(input.email)?;

        // Password policy first, before any store traffic
        let password = ClearTextPassword::new(input.password)
            .map_err(|e| IdentityError::Validation(e.to_string()))?;
        let credential_hash = password
            .hash(self.config.pepper())
            .map_err(|e| IdentityError::Internal(e.to_string()))?;

        if self.accounts.exists_by_email(&email).await? {
            return Err(IdentityError::EmailTaken);
        }

        let code = numeric_code(self.config.code_length);

        let payload = serde_json::to_value(PendingRegistration {
            credential_hash: credential_hash.as_phc_string().to_string(),
            display_name: input.display_name,
            phone: input.phone,
        })
        .map_err(|e| IdentityError::Internal(e.to_string()))?;

        let entry = VerificationEntry::new(
            VerificationPurpose::Register,
            email.as_str().to_string(),
            code.clone(),
            Some(payload),
            self.config.code_ttl(VerificationPurpose::Register),
        );
        self.verifications.put(&entry).await?;

        // Best-effort: a delivery failure leaves only the overwritable entry
        if let Err(e) = self
            .delivery
            .deliver(&email, VerificationPurpose::Register, &code)
            .await
        {
            tracing::warn!(email = %email, error = %e, "Registration code delivery failed");
        }

        tracing::info!(email = %email, "Registration challenge issued");
        Ok(())
    }

    /// Verify the code and create the Account (exactly once)
    pub async fn verify(&self, email: String, code: String) -> IdentityResult<Account> {
        let email = Email::new(email)?;

        // Defensive recheck before touching the cache: a verify after the
        // Account exists is a Conflict even if an entry is still present
        if self.accounts.exists_by_email(&email).await? {
            return Err(IdentityError::EmailTaken);
        }

        let entry = match self
            .verifications
            .check(VerificationPurpose::Register, email.as_str(), &code)
            .await?
        {
            CodeCheck::Consumed(entry) => entry,
            CodeCheck::Miss => return Err(IdentityError::CodeMissing),
            CodeCheck::Mismatch => return Err(IdentityError::CodeMismatch),
        };

        let pending: PendingRegistration = entry
            .payload
            .ok_or_else(|| IdentityError::Internal("Registration entry lost its payload".into()))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| IdentityError::Internal(e.to_string()))
            })?;

        let credential_hash = HashedPassword::from_phc_string(pending.credential_hash)
            .map_err(|e| IdentityError::Internal(e.to_string()))?;

        let account = Account::new(email, credential_hash, pending.display_name, pending.phone);

        // The unique constraint closes the remaining race: a concurrent
        // create still surfaces as EmailTaken, never a duplicate
        self.accounts.create(&account).await?;

        tracing::info!(account_id = %account.account_id, "Account created");
        Ok(account)
    }
}
