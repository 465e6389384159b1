//! Administrative Account Operations
//!
//! Role changes and lock toggles. Both refuse to target the acting account
//! itself; the self-target guard runs before the privilege check so even an
//! administrator aiming at themselves gets the self-target rejection, not a
//! role error.

use std::sync::Arc;

use kernel::id::AccountId;

use crate::domain::repository::{AccountRepository, SessionRepository};
use crate::domain::value_object::AccountRole;
use crate::error::{IdentityError, IdentityResult};

/// Admin operations use case
pub struct AccountAdminUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository,
{
    accounts: Arc<A>,
    sessions: Arc<S>,
}

impl<A, S> AccountAdminUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository,
{
    pub fn new(accounts: Arc<A>, sessions: Arc<S>) -> Self {
        Self { accounts, sessions }
    }

    fn guard(actor_id: &AccountId, actor_role: AccountRole, target_id: &AccountId) -> IdentityResult<()> {
        if actor_id == target_id {
            return Err(IdentityError::SelfTarget);
        }
        if !actor_role.is_admin() {
            return Err(IdentityError::Forbidden);
        }
        Ok(())
    }

    /// Change another account's role
    pub async fn update_role(
        &self,
        actor_id: &AccountId,
        actor_role: AccountRole,
        target_id: &AccountId,
        role: AccountRole,
    ) -> IdentityResult<()> {
        Self::guard(actor_id, actor_role, target_id)?;

        self.accounts.update_role(target_id, role).await?;

        tracing::info!(
            actor_id = %actor_id,
            target_id = %target_id,
            role = %role,
            "Account role changed"
        );
        Ok(())
    }

    /// Lock or unlock another account
    ///
    /// Locking also revokes the target's sessions so the lock takes effect
    /// immediately, not at the next token expiry.
    pub async fn set_locked(
        &self,
        actor_id: &AccountId,
        actor_role: AccountRole,
        target_id: &AccountId,
        locked: bool,
    ) -> IdentityResult<()> {
        Self::guard(actor_id, actor_role, target_id)?;

        self.accounts.set_locked(target_id, locked).await?;

        if locked {
            let revoked = self.sessions.delete_all_for_account(target_id).await?;
            tracing::info!(
                actor_id = %actor_id,
                target_id = %target_id,
                revoked,
                "Account locked and sessions revoked"
            );
        } else {
            tracing::info!(actor_id = %actor_id, target_id = %target_id, "Account unlocked");
        }
        Ok(())
    }
}
