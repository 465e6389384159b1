//! Session Entity
//!
//! Durable, revocable record backing a bearer token. Session expiry is
//! independent of the token's cryptographic expiry; the gateway requires
//! both. Multiple sessions per account are permitted (multi-device login).

use chrono::{DateTime, Duration, Utc};
use kernel::id::{AccountId, SessionId};

/// Session entity
#[derive(Debug, Clone)]
pub struct Session {
    /// Session ID (UUID v4)
    pub session_id: SessionId,
    /// Owning account
    pub account_id: AccountId,
    /// The bearer token this session backs (unique)
    pub token: String,
    /// Session expiration (Unix timestamp ms)
    pub expires_at_ms: i64,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp
    pub last_activity_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session
    ///
    /// TTL is provided by the application layer (config), not hard-coded here.
    pub fn new(account_id: AccountId, token: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            session_id: SessionId::new(),
            account_id,
            token,
            expires_at_ms: (now + ttl).timestamp_millis(),
            created_at: now,
            last_activity_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }

    /// Update last activity timestamp
    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_not_expired_within_ttl() {
        let session = Session::new(AccountId::new(), "tok".to_string(), Duration::hours(24));
        assert!(!session.is_expired());
    }

    #[test]
    fn test_session_expired_after_ttl() {
        let session = Session::new(AccountId::new(), "tok".to_string(), Duration::seconds(-1));
        assert!(session.is_expired());
    }

    #[test]
    fn test_touch_advances_activity() {
        let mut session = Session::new(AccountId::new(), "tok".to_string(), Duration::hours(1));
        let before = session.last_activity_at;
        session.touch();
        assert!(session.last_activity_at >= before);
    }
}
