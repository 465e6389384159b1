//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer.

use kernel::id::AccountId;
use platform::password::HashedPassword;

use crate::domain::entity::{Account, Session, VerificationEntry, VerificationPurpose};
use crate::domain::value_object::{AccountRole, Email};
use crate::error::IdentityResult;

/// Account repository trait
///
/// Mutations return `AccountNotFound` when the id is absent. `create` relies
/// on the storage layer's uniqueness constraint (not a prior read-check) to
/// close the race between check and insert, surfacing `EmailTaken`.
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Create a new account; `EmailTaken` if the email is already present
    async fn create(&self, account: &Account) -> IdentityResult<()>;

    /// Find account by ID
    async fn find_by_id(&self, account_id: &AccountId) -> IdentityResult<Option<Account>>;

    /// Find account by email
    async fn find_by_email(&self, email: &Email) -> IdentityResult<Option<Account>>;

    /// Check if an account exists for the email
    async fn exists_by_email(&self, email: &Email) -> IdentityResult<bool>;

    /// Commit a verified email change
    async fn update_email(&self, account_id: &AccountId, email: &Email) -> IdentityResult<()>;

    /// Replace the credential hash
    async fn update_credential(
        &self,
        account_id: &AccountId,
        credential_hash: &HashedPassword,
    ) -> IdentityResult<()>;

    /// Change the account role
    async fn update_role(&self, account_id: &AccountId, role: AccountRole) -> IdentityResult<()>;

    /// Lock or unlock the account
    async fn set_locked(&self, account_id: &AccountId, locked: bool) -> IdentityResult<()>;

    /// Stamp a successful authentication
    async fn record_authentication(&self, account_id: &AccountId) -> IdentityResult<()>;
}

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Insert a new session row; never updates an existing one
    async fn create(&self, session: &Session) -> IdentityResult<()>;

    /// Find a session by its token
    ///
    /// Expired rows are returned too: the caller distinguishes a revoked
    /// session (no row) from an expired one (row past its expiry).
    async fn find_by_token(&self, token: &str) -> IdentityResult<Option<Session>>;

    /// Update last-activity bookkeeping
    async fn update_activity(&self, session: &Session) -> IdentityResult<()>;

    /// Delete one session (single logout); returns rows deleted
    async fn delete_by_token(&self, token: &str) -> IdentityResult<u64>;

    /// Delete every session for an account (logout-everywhere, admin revoke)
    async fn delete_all_for_account(&self, account_id: &AccountId) -> IdentityResult<u64>;

    /// Maintenance sweep; not required for correctness since expiry is also
    /// checked at read time
    async fn cleanup_expired(&self) -> IdentityResult<u64>;
}

/// Outcome of checking a supplied one-time code
#[derive(Debug)]
pub enum CodeCheck {
    /// Code matched; the entry has been consumed (deleted) and is returned
    Consumed(VerificationEntry),
    /// No live entry for the key (never issued, or expired)
    Miss,
    /// Entry is live but the supplied code differs; entry not consumed
    Mismatch,
}

/// Verification store trait (ephemeral, TTL-keyed challenge material)
#[trait_variant::make(VerificationStore: Send)]
pub trait LocalVerificationStore {
    /// Store an entry, unconditionally overwriting any existing entry for
    /// the same (purpose, identifier). Concurrent puts race; last writer
    /// wins, which is the documented behavior for re-requested codes.
    async fn put(&self, entry: &VerificationEntry) -> IdentityResult<()>;

    /// Check a supplied code against the live entry for the key
    ///
    /// Consumes the entry only on a match; a mismatch must leave it intact
    /// so the caller keeps their remaining attempts until TTL expiry.
    async fn check(
        &self,
        purpose: VerificationPurpose,
        identifier: &str,
        supplied_code: &str,
    ) -> IdentityResult<CodeCheck>;

    /// Maintenance sweep of expired entries
    async fn cleanup_expired(&self) -> IdentityResult<u64>;
}

/// One-time-code delivery collaborator (email transport is external)
///
/// Delivery is best-effort: flows log failures and continue, because the
/// entry is recoverable and overwritable until it expires.
#[trait_variant::make(CodeDelivery: Send)]
pub trait LocalCodeDelivery {
    async fn deliver(
        &self,
        recipient: &Email,
        purpose: VerificationPurpose,
        code: &str,
    ) -> IdentityResult<()>;
}
