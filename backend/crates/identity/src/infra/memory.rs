//! In-Memory Repository Implementation
//!
//! Mirrors the Postgres semantics (uniqueness, overwrite-on-put, consume
//! only on match, no expiry filter on token lookup) without a database.
//! Used by tests; also handy for local experiments.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use kernel::id::AccountId;
use platform::password::HashedPassword;

use crate::domain::entity::{Account, Session, VerificationEntry, VerificationPurpose};
use crate::domain::repository::{
    AccountRepository, CodeCheck, SessionRepository, VerificationStore,
};
use crate::domain::value_object::{AccountRole, Email};
use crate::error::{IdentityError, IdentityResult};

#[derive(Default)]
struct Inner {
    accounts: HashMap<AccountId, Account>,
    sessions: HashMap<String, Session>,
    verifications: HashMap<(VerificationPurpose, String), VerificationEntry>,
}

/// In-memory identity repository
#[derive(Default)]
pub struct MemoryIdentityRepository {
    inner: Mutex<Inner>,
}

impl MemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Lock poisoning only happens after a panic in another test thread
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AccountRepository for MemoryIdentityRepository {
    async fn create(&self, account: &Account) -> IdentityResult<()> {
        let mut inner = self.lock();
        if inner.accounts.values().any(|a| a.email == account.email) {
            return Err(IdentityError::EmailTaken);
        }
        inner.accounts.insert(account.account_id, account.clone());
        Ok(())
    }

    async fn find_by_id(&self, account_id: &AccountId) -> IdentityResult<Option<Account>> {
        Ok(self.lock().accounts.get(account_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> IdentityResult<Option<Account>> {
        Ok(self
            .lock()
            .accounts
            .values()
            .find(|a| a.email == *email)
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> IdentityResult<bool> {
        Ok(self.lock().accounts.values().any(|a| a.email == *email))
    }

    async fn update_email(&self, account_id: &AccountId, email: &Email) -> IdentityResult<()> {
        let mut inner = self.lock();
        if inner
            .accounts
            .values()
            .any(|a| a.email == *email && a.account_id != *account_id)
        {
            return Err(IdentityError::EmailTaken);
        }
        let account = inner
            .accounts
            .get_mut(account_id)
            .ok_or(IdentityError::AccountNotFound)?;
        account.email = email.clone();
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn update_credential(
        &self,
        account_id: &AccountId,
        credential_hash: &HashedPassword,
    ) -> IdentityResult<()> {
        let mut inner = self.lock();
        let account = inner
            .accounts
            .get_mut(account_id)
            .ok_or(IdentityError::AccountNotFound)?;
        account.credential_hash = credential_hash.clone();
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn update_role(&self, account_id: &AccountId, role: AccountRole) -> IdentityResult<()> {
        let mut inner = self.lock();
        let account = inner
            .accounts
            .get_mut(account_id)
            .ok_or(IdentityError::AccountNotFound)?;
        account.role = role;
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn set_locked(&self, account_id: &AccountId, locked: bool) -> IdentityResult<()> {
        let mut inner = self.lock();
        let account = inner
            .accounts
            .get_mut(account_id)
            .ok_or(IdentityError::AccountNotFound)?;
        account.locked = locked;
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn record_authentication(&self, account_id: &AccountId) -> IdentityResult<()> {
        let mut inner = self.lock();
        let account = inner
            .accounts
            .get_mut(account_id)
            .ok_or(IdentityError::AccountNotFound)?;
        account.last_authenticated_at = Some(Utc::now());
        Ok(())
    }
}

impl SessionRepository for MemoryIdentityRepository {
    async fn create(&self, session: &Session) -> IdentityResult<()> {
        self.lock()
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> IdentityResult<Option<Session>> {
        // Expired rows are returned; callers distinguish expired from absent
        Ok(self.lock().sessions.get(token).cloned())
    }

    async fn update_activity(&self, session: &Session) -> IdentityResult<()> {
        if let Some(stored) = self.lock().sessions.get_mut(&session.token) {
            stored.last_activity_at = session.last_activity_at;
        }
        Ok(())
    }

    async fn delete_by_token(&self, token: &str) -> IdentityResult<u64> {
        Ok(self.lock().sessions.remove(token).map_or(0, |_| 1))
    }

    async fn delete_all_for_account(&self, account_id: &AccountId) -> IdentityResult<u64> {
        let mut inner = self.lock();
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| s.account_id != *account_id);
        Ok((before - inner.sessions.len()) as u64)
    }

    async fn cleanup_expired(&self) -> IdentityResult<u64> {
        let now_ms = Utc::now().timestamp_millis();
        let mut inner = self.lock();
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| s.expires_at_ms >= now_ms);
        Ok((before - inner.sessions.len()) as u64)
    }
}

impl VerificationStore for MemoryIdentityRepository {
    async fn put(&self, entry: &VerificationEntry) -> IdentityResult<()> {
        self.lock()
            .verifications
            .insert((entry.purpose, entry.identifier.clone()), entry.clone());
        Ok(())
    }

    async fn check(
        &self,
        purpose: VerificationPurpose,
        identifier: &str,
        supplied_code: &str,
    ) -> IdentityResult<CodeCheck> {
        let mut inner = self.lock();
        let key = (purpose, identifier.to_string());

        let Some(entry) = inner.verifications.remove(&key) else {
            return Ok(CodeCheck::Miss);
        };

        if entry.is_expired() {
            return Ok(CodeCheck::Miss);
        }

        if !platform::crypto::constant_time_eq(entry.code.as_bytes(), supplied_code.as_bytes()) {
            // Not consumed; remaining attempts survive until TTL expiry
            inner.verifications.insert(key, entry);
            return Ok(CodeCheck::Mismatch);
        }

        Ok(CodeCheck::Consumed(entry))
    }

    async fn cleanup_expired(&self) -> IdentityResult<u64> {
        let mut inner = self.lock();
        let before = inner.verifications.len();
        inner.verifications.retain(|_, e| !e.is_expired());
        Ok((before - inner.verifications.len()) as u64)
    }
}
