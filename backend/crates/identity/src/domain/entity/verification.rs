//! Verification Entry Entity
//!
//! Ephemeral, TTL-keyed proof material for registration, email change, and
//! password reset. At most one live entry per (purpose, identifier); a new
//! challenge overwrites any prior one. Entries are single-use: deleted on
//! successful verification, or left to expire.

use chrono::{DateTime, Duration, Utc};

use crate::error::{IdentityError, IdentityResult};

/// What an in-flight verification is proving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum VerificationPurpose {
    Register = 0,
    ChangeEmail = 1,
    ResetPassword = 2,
}

impl VerificationPurpose {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use VerificationPurpose::*;
        match self {
            Register => "register",
            ChangeEmail => "change-email",
            ResetPassword => "reset-password",
        }
    }

    pub fn from_id(id: i16) -> IdentityResult<Self> {
        use VerificationPurpose::*;
        match id {
            0 => Ok(Register),
            1 => Ok(ChangeEmail),
            2 => Ok(ResetPassword),
            _ => Err(IdentityError::Internal(format!(
                "Invalid VerificationPurpose id: {}",
                id
            ))),
        }
    }
}

impl std::fmt::Display for VerificationPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Verification entry - one in-flight challenge
#[derive(Debug, Clone)]
pub struct VerificationEntry {
    pub purpose: VerificationPurpose,
    /// Challenge key within the purpose (an email for registration and
    /// password reset, an account id for email change)
    pub identifier: String,
    /// One-time code the caller must echo back
    pub code: String,
    /// Pending payload committed only on successful verification
    pub payload: Option<serde_json::Value>,
    /// Entry expiration (Unix timestamp ms)
    pub expires_at_ms: i64,
    pub created_at: DateTime<Utc>,
}

impl VerificationEntry {
    /// Create a new entry
    ///
    /// TTL comes from configuration (fixed per purpose).
    pub fn new(
        purpose: VerificationPurpose,
        identifier: String,
        code: String,
        payload: Option<serde_json::Value>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            purpose,
            identifier,
            code,
            payload,
            expires_at_ms: (now + ttl).timestamp_millis(),
            created_at: now,
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purpose_roundtrip() {
        for purpose in [
            VerificationPurpose::Register,
            VerificationPurpose::ChangeEmail,
            VerificationPurpose::ResetPassword,
        ] {
            assert_eq!(VerificationPurpose::from_id(purpose.id()).unwrap(), purpose);
        }
        assert!(VerificationPurpose::from_id(7).is_err());
    }

    #[test]
    fn test_entry_expiry() {
        let live = VerificationEntry::new(
            VerificationPurpose::Register,
            "a@x.com".to_string(),
            "123456".to_string(),
            None,
            Duration::minutes(10),
        );
        assert!(!live.is_expired());

        let dead = VerificationEntry::new(
            VerificationPurpose::Register,
            "a@x.com".to_string(),
            "123456".to_string(),
            None,
            Duration::seconds(-1),
        );
        assert!(dead.is_expired());
    }
}
