//! Application Configuration
//!
//! Configuration for the identity application layer.

use std::time::Duration;

use crate::domain::entity::VerificationPurpose;

/// Identity application configuration
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Secret key for HMAC token signing (32 bytes)
    pub token_secret: [u8; 32],
    /// Token cryptographic validity window (24 hours)
    pub token_ttl: Duration,
    /// Session validity window; provisioned together with the token at login
    pub session_ttl: Duration,
    /// Verification TTL for registration (10 minutes)
    pub registration_code_ttl: Duration,
    /// Verification TTL for email change and password reset (5 minutes)
    pub recovery_code_ttl: Duration,
    /// One-time code length
    pub code_length: usize,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            token_secret: [0u8; 32],
            token_ttl: Duration::from_secs(24 * 3600),
            session_ttl: Duration::from_secs(24 * 3600),
            registration_code_ttl: Duration::from_secs(10 * 60),
            recovery_code_ttl: Duration::from_secs(5 * 60),
            code_length: 6,
            password_pepper: None,
        }
    }
}

impl IdentityConfig {
    /// Create config with a random token secret (for development)
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            token_secret: secret,
            ..Default::default()
        }
    }

    /// Verification TTL for a purpose as a chrono duration
    pub fn code_ttl(&self, purpose: VerificationPurpose) -> chrono::Duration {
        let ttl = match purpose {
            VerificationPurpose::Register => self.registration_code_ttl,
            VerificationPurpose::ChangeEmail | VerificationPurpose::ResetPassword => {
                self.recovery_code_ttl
            }
        };
        chrono::Duration::milliseconds(ttl.as_millis() as i64)
    }

    /// Session TTL as a chrono duration
    pub fn session_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.session_ttl.as_millis() as i64)
    }

    /// Get the password pepper as a slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}
