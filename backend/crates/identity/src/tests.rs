//! Flow tests for the identity crate
//!
//! Exercised against the in-memory repository, which mirrors the Postgres
//! semantics (consume-on-match, no expiry filter on token lookup).

use std::sync::Arc;

use crate::application::{
    AccountAdminUseCase, AuthorizeRequestUseCase, EmailChangeUseCase, IdentityConfig,
    PasswordResetUseCase, RegisterUseCase, SignInUseCase, SignOutUseCase, StartRegistrationInput,
};
use crate::domain::entity::{Account, VerificationPurpose};
use crate::domain::repository::{AccountRepository, CodeCheck, VerificationStore};
use crate::domain::value_object::AccountRole;
use crate::error::IdentityError;
use crate::infra::delivery::CapturingCodeDelivery;
use crate::infra::memory::MemoryIdentityRepository;

struct Harness {
    repo: Arc<MemoryIdentityRepository>,
    delivery: Arc<CapturingCodeDelivery>,
    config: Arc<IdentityConfig>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(IdentityConfig::with_random_secret())
    }

    fn with_config(config: IdentityConfig) -> Self {
        Self {
            repo: Arc::new(MemoryIdentityRepository::new()),
            delivery: Arc::new(CapturingCodeDelivery::new()),
            config: Arc::new(config),
        }
    }

    fn register_use_case(
        &self,
    ) -> RegisterUseCase<MemoryIdentityRepository, MemoryIdentityRepository, CapturingCodeDelivery>
    {
        RegisterUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.delivery.clone(),
            self.config.clone(),
        )
    }

    fn sign_in_use_case(
        &self,
    ) -> SignInUseCase<MemoryIdentityRepository, MemoryIdentityRepository> {
        SignInUseCase::new(self.repo.clone(), self.repo.clone(), self.config.clone())
    }

    fn gateway(&self) -> AuthorizeRequestUseCase<MemoryIdentityRepository> {
        AuthorizeRequestUseCase::new(self.repo.clone(), self.config.clone())
    }

    /// Register and verify an account, returning it
    async fn registered_account(&self, email: &str, password: &str, name: &str) -> Account {
        self.register_use_case()
            .start(StartRegistrationInput {
                email: email.to_string(),
                password: password.to_string(),
                display_name: name.to_string(),
                phone: None,
            })
            .await
            .unwrap();

        let code = self.delivery.last_code_for(email).unwrap();
        self.register_use_case()
            .verify(email.to_string(), code)
            .await
            .unwrap()
    }
}

// ============================================================================
// Registration
// ============================================================================

mod registration_tests {
    use super::*;

    #[tokio::test]
    async fn test_register_round_trip() {
        let h = Harness::new();

        let account = h.registered_account("ann@example.com", "Secret1!", "Ann").await;
        assert_eq!(account.email.as_str(), "ann@example.com");
        assert_eq!(account.role, AccountRole::User);
        assert!(!account.locked);

        // The freshly created account can log in
        let output = h
            .sign_in_use_case()
            .execute("ann@example.com".to_string(), "Secret1!".to_string())
            .await
            .unwrap();
        assert_eq!(output.account.account_id, account.account_id);
        assert!(!output.token.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_code_does_not_consume_entry() {
        let h = Harness::new();

        h.register_use_case()
            .start(StartRegistrationInput {
                email: "ann@example.com".to_string(),
                password: "Secret1!".to_string(),
                display_name: "Ann".to_string(),
                phone: None,
            })
            .await
            .unwrap();

        let result = h
            .register_use_case()
            .verify("ann@example.com".to_string(), "000000".to_string())
            .await;
        assert!(matches!(result, Err(IdentityError::CodeMismatch)));

        // The correct code still works after a mismatch
        let code = h.delivery.last_code_for("ann@example.com").unwrap();
        assert!(
            h.register_use_case()
                .verify("ann@example.com".to_string(), code)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_verify_is_exactly_once() {
        let h = Harness::new();

        h.register_use_case()
            .start(StartRegistrationInput {
                email: "ann@example.com".to_string(),
                password: "Secret1!".to_string(),
                display_name: "Ann".to_string(),
                phone: None,
            })
            .await
            .unwrap();

        let code = h.delivery.last_code_for("ann@example.com").unwrap();
        h.register_use_case()
            .verify("ann@example.com".to_string(), code.clone())
            .await
            .unwrap();

        // Replaying the same correct code is a conflict, not a second account
        let result = h
            .register_use_case()
            .verify("ann@example.com".to_string(), code)
            .await;
        assert!(matches!(result, Err(IdentityError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_successful_verify_consumes_entry() {
        let h = Harness::new();

        h.register_use_case()
            .start(StartRegistrationInput {
                email: "ann@example.com".to_string(),
                password: "Secret1!".to_string(),
                display_name: "Ann".to_string(),
                phone: None,
            })
            .await
            .unwrap();

        let code = h.delivery.last_code_for("ann@example.com").unwrap();
        h.register_use_case()
            .verify("ann@example.com".to_string(), code.clone())
            .await
            .unwrap();

        // The entry itself is gone, independent of the account pre-check
        let check = h
            .repo
            .check(VerificationPurpose::Register, "ann@example.com", &code)
            .await
            .unwrap();
        assert!(matches!(check, CodeCheck::Miss));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_at_start() {
        let h = Harness::new();
        h.registered_account("ann@example.com", "Secret1!", "Ann").await;

        let result = h
            .register_use_case()
            .start(StartRegistrationInput {
                email: "ann@example.com".to_string(),
                password: "Other2pass".to_string(),
                display_name: "Imposter".to_string(),
                phone: None,
            })
            .await;
        assert!(matches!(result, Err(IdentityError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_expired_code_is_a_miss() {
        let mut config = IdentityConfig::with_random_secret();
        config.registration_code_ttl = std::time::Duration::ZERO;
        let h = Harness::with_config(config);

        h.register_use_case()
            .start(StartRegistrationInput {
                email: "ann@example.com".to_string(),
                password: "Secret1!".to_string(),
                display_name: "Ann".to_string(),
                phone: None,
            })
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let code = h.delivery.last_code_for("ann@example.com").unwrap();
        let result = h
            .register_use_case()
            .verify("ann@example.com".to_string(), code)
            .await;
        assert!(matches!(result, Err(IdentityError::CodeMissing)));
    }

    #[tokio::test]
    async fn test_weak_password_rejected_before_challenge() {
        let h = Harness::new();

        let result = h
            .register_use_case()
            .start(StartRegistrationInput {
                email: "ann@example.com".to_string(),
                password: "letters".to_string(),
                display_name: "Ann".to_string(),
                phone: None,
            })
            .await;
        assert!(matches!(result, Err(IdentityError::Validation(_))));
        assert!(h.delivery.last_code_for("ann@example.com").is_none());
    }
}

// ============================================================================
// Login and the Auth Gateway
// ============================================================================

mod gateway_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let h = Harness::new();
        let result = h.gateway().execute(None).await;
        assert!(matches!(result, Err(IdentityError::MissingToken)));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected_as_invalid() {
        let h = Harness::new();
        let result = h.gateway().execute(Some("not.a-token")).await;
        assert!(matches!(result, Err(IdentityError::TokenInvalid)));
    }

    #[tokio::test]
    async fn test_valid_token_passes_both_layers() {
        let h = Harness::new();
        let account = h.registered_account("ann@example.com", "Secret1!", "Ann").await;

        let output = h
            .sign_in_use_case()
            .execute("ann@example.com".to_string(), "Secret1!".to_string())
            .await
            .unwrap();

        let identity = h.gateway().execute(Some(&output.token)).await.unwrap();
        assert_eq!(identity.account_id, account.account_id);
        assert_eq!(identity.email, "ann@example.com");
        assert_eq!(identity.role, AccountRole::User);
    }

    #[tokio::test]
    async fn test_logout_revokes_a_still_valid_token() {
        let h = Harness::new();
        h.registered_account("ann@example.com", "Secret1!", "Ann").await;

        let output = h
            .sign_in_use_case()
            .execute("ann@example.com".to_string(), "Secret1!".to_string())
            .await
            .unwrap();

        SignOutUseCase::new(h.repo.clone(), h.config.clone())
            .execute(&output.token)
            .await
            .unwrap();

        // The signature still verifies; the missing session row is what
        // rejects it, with its own reason
        let result = h.gateway().execute(Some(&output.token)).await;
        assert!(matches!(result, Err(IdentityError::SessionRevoked)));
    }

    #[tokio::test]
    async fn test_session_expiry_is_distinct_from_revocation() {
        let mut config = IdentityConfig::with_random_secret();
        config.session_ttl = std::time::Duration::ZERO;
        let h = Harness::with_config(config);
        h.registered_account("ann@example.com", "Secret1!", "Ann").await;

        let output = h
            .sign_in_use_case()
            .execute("ann@example.com".to_string(), "Secret1!".to_string())
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let result = h.gateway().execute(Some(&output.token)).await;
        assert!(matches!(result, Err(IdentityError::SessionExpired)));
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let h = Harness::new();
        h.registered_account("ann@example.com", "Secret1!", "Ann").await;

        let result = h
            .sign_in_use_case()
            .execute("ann@example.com".to_string(), "Wrong2pass".to_string())
            .await;
        assert!(matches!(result, Err(IdentityError::InvalidCredentials)));

        // Unknown email gives the same rejection
        let result = h
            .sign_in_use_case()
            .execute("ghost@example.com".to_string(), "Secret1!".to_string())
            .await;
        assert!(matches!(result, Err(IdentityError::InvalidCredentials)));
    }
}

// ============================================================================
// Password Reset
// ============================================================================

mod password_reset_tests {
    use super::*;

    fn use_case(
        h: &Harness,
    ) -> PasswordResetUseCase<MemoryIdentityRepository, MemoryIdentityRepository, CapturingCodeDelivery>
    {
        PasswordResetUseCase::new(
            h.repo.clone(),
            h.repo.clone(),
            h.delivery.clone(),
            h.config.clone(),
        )
    }

    #[tokio::test]
    async fn test_reset_replaces_credential() {
        let h = Harness::new();
        h.registered_account("ann@example.com", "Secret1!", "Ann").await;

        use_case(&h).start("ann@example.com".to_string()).await.unwrap();
        let code = h.delivery.last_code_for("ann@example.com").unwrap();

        use_case(&h)
            .confirm(
                "ann@example.com".to_string(),
                code,
                "Fresh3start".to_string(),
            )
            .await
            .unwrap();

        // Old password dead, new password live
        let old = h
            .sign_in_use_case()
            .execute("ann@example.com".to_string(), "Secret1!".to_string())
            .await;
        assert!(matches!(old, Err(IdentityError::InvalidCredentials)));

        assert!(
            h.sign_in_use_case()
                .execute("ann@example.com".to_string(), "Fresh3start".to_string())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_unknown_email_reported() {
        let h = Harness::new();
        let result = use_case(&h).start("ghost@example.com".to_string()).await;
        assert!(matches!(result, Err(IdentityError::AccountNotFound)));
    }

    #[tokio::test]
    async fn test_policy_rejection_keeps_code_usable() {
        let h = Harness::new();
        h.registered_account("ann@example.com", "Secret1!", "Ann").await;

        use_case(&h).start("ann@example.com".to_string()).await.unwrap();
        let code = h.delivery.last_code_for("ann@example.com").unwrap();

        // Policy failure happens before the code is checked
        let result = use_case(&h)
            .confirm("ann@example.com".to_string(), code.clone(), "short".to_string())
            .await;
        assert!(matches!(result, Err(IdentityError::Validation(_))));

        assert!(
            use_case(&h)
                .confirm("ann@example.com".to_string(), code, "Fresh3start".to_string())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_wrong_code_does_not_consume() {
        let h = Harness::new();
        h.registered_account("ann@example.com", "Secret1!", "Ann").await;

        use_case(&h).start("ann@example.com".to_string()).await.unwrap();

        let result = use_case(&h)
            .confirm(
                "ann@example.com".to_string(),
                "000000".to_string(),
                "Fresh3start".to_string(),
            )
            .await;
        assert!(matches!(result, Err(IdentityError::CodeMismatch)));

        let code = h.delivery.last_code_for("ann@example.com").unwrap();
        assert!(
            use_case(&h)
                .confirm("ann@example.com".to_string(), code, "Fresh3start".to_string())
                .await
                .is_ok()
        );
    }
}

// ============================================================================
// Email Change
// ============================================================================

mod email_change_tests {
    use super::*;

    fn use_case(
        h: &Harness,
    ) -> EmailChangeUseCase<MemoryIdentityRepository, MemoryIdentityRepository, CapturingCodeDelivery>
    {
        EmailChangeUseCase::new(
            h.repo.clone(),
            h.repo.clone(),
            h.delivery.clone(),
            h.config.clone(),
        )
    }

    #[tokio::test]
    async fn test_email_change_round_trip() {
        let h = Harness::new();
        let account = h.registered_account("ann@example.com", "Secret1!", "Ann").await;

        use_case(&h)
            .start(&account.account_id, "ann.new@example.com".to_string())
            .await
            .unwrap();

        // The challenge goes to the address being proven
        let code = h.delivery.last_code_for("ann.new@example.com").unwrap();

        let email = use_case(&h).verify(&account.account_id, code).await.unwrap();
        assert_eq!(email.as_str(), "ann.new@example.com");

        // Login now keys off the new address
        assert!(
            h.sign_in_use_case()
                .execute("ann.new@example.com".to_string(), "Secret1!".to_string())
                .await
                .is_ok()
        );
        let old = h
            .sign_in_use_case()
            .execute("ann@example.com".to_string(), "Secret1!".to_string())
            .await;
        assert!(matches!(old, Err(IdentityError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_taken_address_rejected() {
        let h = Harness::new();
        let ann = h.registered_account("ann@example.com", "Secret1!", "Ann").await;
        h.registered_account("bob@example.com", "Secret1!", "Bob").await;

        let result = use_case(&h)
            .start(&ann.account_id, "bob@example.com".to_string())
            .await;
        assert!(matches!(result, Err(IdentityError::EmailTaken)));
    }
}

// ============================================================================
// Administrative Operations
// ============================================================================

mod admin_tests {
    use super::*;

    fn use_case(
        h: &Harness,
    ) -> AccountAdminUseCase<MemoryIdentityRepository, MemoryIdentityRepository> {
        AccountAdminUseCase::new(h.repo.clone(), h.repo.clone())
    }

    async fn admin_account(h: &Harness) -> Account {
        let account = h.registered_account("root@example.com", "Secret1!", "Root").await;
        h.repo
            .update_role(&account.account_id, AccountRole::Admin)
            .await
            .unwrap();
        account
    }

    #[tokio::test]
    async fn test_admin_can_change_role_and_lock() {
        let h = Harness::new();
        let admin = admin_account(&h).await;
        let target = h.registered_account("ann@example.com", "Secret1!", "Ann").await;

        use_case(&h)
            .update_role(
                &admin.account_id,
                AccountRole::Admin,
                &target.account_id,
                AccountRole::Moderator,
            )
            .await
            .unwrap();

        let reloaded = h.repo.find_by_id(&target.account_id).await.unwrap().unwrap();
        assert_eq!(reloaded.role, AccountRole::Moderator);

        use_case(&h)
            .set_locked(&admin.account_id, AccountRole::Admin, &target.account_id, true)
            .await
            .unwrap();

        let locked = h.repo.find_by_id(&target.account_id).await.unwrap().unwrap();
        assert!(locked.locked);

        // A locked account can no longer log in
        let result = h
            .sign_in_use_case()
            .execute("ann@example.com".to_string(), "Secret1!".to_string())
            .await;
        assert!(matches!(result, Err(IdentityError::AccountLocked)));
    }

    #[tokio::test]
    async fn test_lock_revokes_live_sessions() {
        let h = Harness::new();
        let admin = admin_account(&h).await;
        let target = h.registered_account("ann@example.com", "Secret1!", "Ann").await;

        let output = h
            .sign_in_use_case()
            .execute("ann@example.com".to_string(), "Secret1!".to_string())
            .await
            .unwrap();
        assert!(h.gateway().execute(Some(&output.token)).await.is_ok());

        use_case(&h)
            .set_locked(&admin.account_id, AccountRole::Admin, &target.account_id, true)
            .await
            .unwrap();

        let result = h.gateway().execute(Some(&output.token)).await;
        assert!(matches!(result, Err(IdentityError::SessionRevoked)));
    }

    #[tokio::test]
    async fn test_self_target_guard_precedes_role_check() {
        let h = Harness::new();
        let admin = admin_account(&h).await;

        // Even an admin aiming at themselves gets the self-target rejection
        let result = use_case(&h)
            .set_locked(&admin.account_id, AccountRole::Admin, &admin.account_id, true)
            .await;
        assert!(matches!(result, Err(IdentityError::SelfTarget)));

        let result = use_case(&h)
            .update_role(
                &admin.account_id,
                AccountRole::Admin,
                &admin.account_id,
                AccountRole::User,
            )
            .await;
        assert!(matches!(result, Err(IdentityError::SelfTarget)));
    }

    #[tokio::test]
    async fn test_non_admin_rejected() {
        let h = Harness::new();
        let user = h.registered_account("ann@example.com", "Secret1!", "Ann").await;
        let target = h.registered_account("bob@example.com", "Secret1!", "Bob").await;

        let result = use_case(&h)
            .update_role(
                &user.account_id,
                AccountRole::User,
                &target.account_id,
                AccountRole::Admin,
            )
            .await;
        assert!(matches!(result, Err(IdentityError::Forbidden)));

        let result = use_case(&h)
            .set_locked(&user.account_id, AccountRole::User, &target.account_id, true)
            .await;
        assert!(matches!(result, Err(IdentityError::Forbidden)));
    }
}
