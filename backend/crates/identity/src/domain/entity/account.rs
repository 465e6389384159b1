//! Account Entity
//!
//! Durable identity record; sole source of truth for credentials, role, and
//! lock state. An Account is only ever created as the terminal step of a
//! successful registration verification, never at challenge-start time.

use chrono::{DateTime, Utc};
use kernel::id::AccountId;
use platform::password::HashedPassword;

use crate::domain::value_object::{AccountRole, Email};

/// Account entity
#[derive(Debug, Clone)]
pub struct Account {
    /// Internal UUID identifier
    pub account_id: AccountId,
    /// Email address (unique, stored lowercase)
    pub email: Email,
    /// Argon2id credential hash; the raw password never reaches this type
    pub credential_hash: HashedPassword,
    /// Display name
    pub display_name: String,
    /// Optional phone number
    pub phone: Option<String>,
    /// Role (User, Moderator, Admin)
    pub role: AccountRole,
    /// Whether an administrator has locked the account
    pub locked: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
    /// Last successful login time
    pub last_authenticated_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create a new account
    pub fn new(
        email: Email,
        credential_hash: HashedPassword,
        display_name: String,
        phone: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            account_id: AccountId::new(),
            email,
            credential_hash,
            display_name,
            phone,
            role: AccountRole::default(),
            locked: false,
            created_at: now,
            updated_at: now,
            last_authenticated_at: None,
        }
    }

    /// Whether this account may authenticate
    pub fn can_authenticate(&self) -> bool {
        !self.locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash() -> HashedPassword {
        platform::password::ClearTextPassword::new_unchecked("Secret1!".to_string())
            .hash(None)
            .unwrap()
    }

    #[test]
    fn test_new_account_defaults() {
        let account = Account::new(
            Email::new("ann@example.com").unwrap(),
            hash(),
            "Ann".to_string(),
            None,
        );
        assert_eq!(account.role, AccountRole::User);
        assert!(!account.locked);
        assert!(account.can_authenticate());
        assert!(account.last_authenticated_at.is_none());
    }

    #[test]
    fn test_locked_account_cannot_authenticate() {
        let mut account = Account::new(
            Email::new("ann@example.com").unwrap(),
            hash(),
            "Ann".to_string(),
            None,
        );
        account.locked = true;
        assert!(!account.can_authenticate());
    }
}
