//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, SessionId};
use platform::password::HashedPassword;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{Account, Session, VerificationEntry, VerificationPurpose};
use crate::domain::repository::{
    AccountRepository, CodeCheck, SessionRepository, VerificationStore,
};
use crate::domain::value_object::{AccountRole, Email};
use crate::error::{IdentityError, IdentityResult};

/// PostgreSQL-backed identity repository
#[derive(Clone)]
pub struct PgIdentityRepository {
    pool: PgPool,
}

impl PgIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Whether the error is a unique-constraint violation (Postgres 23505)
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

// ============================================================================
// Account Repository Implementation
// ============================================================================

impl AccountRepository for PgIdentityRepository {
    async fn create(&self, account: &Account) -> IdentityResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (
                account_id,
                email,
                credential_hash,
                display_name,
                phone,
                role,
                locked,
                created_at,
                updated_at,
                last_authenticated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(account.account_id.as_uuid())
        .bind(account.email.as_str())
        .bind(account.credential_hash.as_phc_string())
        .bind(&account.display_name)
        .bind(&account.phone)
        .bind(account.role.id())
        .bind(account.locked)
        .bind(account.created_at)
        .bind(account.updated_at)
        .bind(account.last_authenticated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(IdentityError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, account_id: &AccountId) -> IdentityResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                account_id,
                email,
                credential_hash,
                display_name,
                phone,
                role,
                locked,
                created_at,
                updated_at,
                last_authenticated_at
            FROM accounts
            WHERE account_id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> IdentityResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                account_id,
                email,
                credential_hash,
                display_name,
                phone,
                role,
                locked,
                created_at,
                updated_at,
                last_authenticated_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> IdentityResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update_email(&self, account_id: &AccountId, email: &Email) -> IdentityResult<()> {
        let result = sqlx::query(
            "UPDATE accounts SET email = $2, updated_at = $3 WHERE account_id = $1",
        )
        .bind(account_id.as_uuid())
        .bind(email.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(r) if r.rows_affected() == 0 => Err(IdentityError::AccountNotFound),
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(IdentityError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_credential(
        &self,
        account_id: &AccountId,
        credential_hash: &HashedPassword,
    ) -> IdentityResult<()> {
        let affected = sqlx::query(
            "UPDATE accounts SET credential_hash = $2, updated_at = $3 WHERE account_id = $1",
        )
        .bind(account_id.as_uuid())
        .bind(credential_hash.as_phc_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(IdentityError::AccountNotFound);
        }
        Ok(())
    }

    async fn update_role(&self, account_id: &AccountId, role: AccountRole) -> IdentityResult<()> {
        let affected = sqlx::query(
            "UPDATE accounts SET role = $2, updated_at = $3 WHERE account_id = $1",
        )
        .bind(account_id.as_uuid())
        .bind(role.id())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(IdentityError::AccountNotFound);
        }
        Ok(())
    }

    async fn set_locked(&self, account_id: &AccountId, locked: bool) -> IdentityResult<()> {
        let affected = sqlx::query(
            "UPDATE accounts SET locked = $2, updated_at = $3 WHERE account_id = $1",
        )
        .bind(account_id.as_uuid())
        .bind(locked)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(IdentityError::AccountNotFound);
        }
        Ok(())
    }

    async fn record_authentication(&self, account_id: &AccountId) -> IdentityResult<()> {
        let affected = sqlx::query(
            "UPDATE accounts SET last_authenticated_at = $2 WHERE account_id = $1",
        )
        .bind(account_id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(IdentityError::AccountNotFound);
        }
        Ok(())
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgIdentityRepository {
    async fn create(&self, session: &Session) -> IdentityResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                session_id,
                account_id,
                token,
                expires_at_ms,
                created_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.account_id.as_uuid())
        .bind(&session.token)
        .bind(session.expires_at_ms)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> IdentityResult<Option<Session>> {
        // No expiry filter here: the gateway must tell an expired row apart
        // from an absent one
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                session_id,
                account_id,
                token,
                expires_at_ms,
                created_at,
                last_activity_at
            FROM sessions
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_session()))
    }

    async fn update_activity(&self, session: &Session) -> IdentityResult<()> {
        sqlx::query("UPDATE sessions SET last_activity_at = $2 WHERE session_id = $1")
            .bind(session.session_id.as_uuid())
            .bind(session.last_activity_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_by_token(&self, token: &str) -> IdentityResult<u64> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn delete_all_for_account(&self, account_id: &AccountId) -> IdentityResult<u64> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE account_id = $1")
            .bind(account_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn cleanup_expired(&self) -> IdentityResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted = sqlx::query("DELETE FROM sessions WHERE expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired sessions");

        Ok(deleted)
    }
}

// ============================================================================
// Verification Store Implementation
// ============================================================================

impl VerificationStore for PgIdentityRepository {
    async fn put(&self, entry: &VerificationEntry) -> IdentityResult<()> {
        sqlx::query(
            r#"
            INSERT INTO verification_entries (
                purpose,
                identifier,
                code,
                payload,
                expires_at_ms,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (purpose, identifier) DO UPDATE SET
                code = EXCLUDED.code,
                payload = EXCLUDED.payload,
                expires_at_ms = EXCLUDED.expires_at_ms,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(entry.purpose.id())
        .bind(&entry.identifier)
        .bind(&entry.code)
        .bind(&entry.payload)
        .bind(entry.expires_at_ms)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn check(
        &self,
        purpose: VerificationPurpose,
        identifier: &str,
        supplied_code: &str,
    ) -> IdentityResult<CodeCheck> {
        let now_ms = Utc::now().timestamp_millis();

        // Atomic consume: the delete only fires when the code matches a live
        // entry, so concurrent checks cannot both succeed
        let row = sqlx::query_as::<_, VerificationRow>(
            r#"
            DELETE FROM verification_entries
            WHERE purpose = $1
              AND identifier = $2
              AND code = $3
              AND expires_at_ms > $4
            RETURNING purpose, identifier, code, payload, expires_at_ms, created_at
            "#,
        )
        .bind(purpose.id())
        .bind(identifier)
        .bind(supplied_code)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(CodeCheck::Consumed(row.into_entry()?));
        }

        // Nothing consumed: a live entry still present means the code was
        // wrong; otherwise the entry never existed or has expired
        let live = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM verification_entries
                WHERE purpose = $1 AND identifier = $2 AND expires_at_ms > $3
            )
            "#,
        )
        .bind(purpose.id())
        .bind(identifier)
        .bind(now_ms)
        .fetch_one(&self.pool)
        .await?;

        if live {
            Ok(CodeCheck::Mismatch)
        } else {
            Ok(CodeCheck::Miss)
        }
    }

    async fn cleanup_expired(&self) -> IdentityResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted = sqlx::query("DELETE FROM verification_entries WHERE expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(entries_deleted = deleted, "Cleaned up expired verification entries");

        Ok(deleted)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    account_id: Uuid,
    email: String,
    credential_hash: String,
    display_name: String,
    phone: Option<String>,
    role: i16,
    locked: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_authenticated_at: Option<DateTime<Utc>>,
}

impl AccountRow {
    fn into_account(self) -> IdentityResult<Account> {
        let credential_hash = HashedPassword::from_phc_string(self.credential_hash)
            .map_err(|e| IdentityError::Internal(format!("Invalid credential hash: {}", e)))?;

        Ok(Account {
            account_id: AccountId::from_uuid(self.account_id),
            email: Email::from_db(self.email),
            credential_hash,
            display_name: self.display_name,
            phone: self.phone,
            role: AccountRole::from_id(self.role)?,
            locked: self.locked,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_authenticated_at: self.last_authenticated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    account_id: Uuid,
    token: String,
    expires_at_ms: i64,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            session_id: SessionId::from_uuid(self.session_id),
            account_id: AccountId::from_uuid(self.account_id),
            token: self.token,
            expires_at_ms: self.expires_at_ms,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VerificationRow {
    purpose: i16,
    identifier: String,
    code: String,
    payload: Option<serde_json::Value>,
    expires_at_ms: i64,
    created_at: DateTime<Utc>,
}

impl VerificationRow {
    fn into_entry(self) -> IdentityResult<VerificationEntry> {
        Ok(VerificationEntry {
            purpose: VerificationPurpose::from_id(self.purpose)?,
            identifier: self.identifier,
            code: self.code,
            payload: self.payload,
            expires_at_ms: self.expires_at_ms,
            created_at: self.created_at,
        })
    }
}
