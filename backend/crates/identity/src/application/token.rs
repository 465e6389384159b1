//! Token Issuer
//!
//! Stateless signer/verifier of bearer credentials. A token is
//! `base64url(claims JSON) . base64url(HMAC-SHA256 signature)` and embeds
//! the identity claims plus a cryptographic expiry. Purely computational:
//! never touches a store, never blocks.
//!
//! Token validity is independent of session validity; the gateway requires
//! both. The two windows are provisioned together at login by convention.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::application::config::IdentityConfig;
use crate::domain::value_object::AccountRole;
use crate::error::{IdentityError, IdentityResult};

type HmacSha256 = Hmac<Sha256>;

/// Identity claims embedded in a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub account_id: Uuid,
    pub email: String,
    pub role: AccountRole,
    /// Issued-at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds)
    pub exp: i64,
}

impl Claims {
    /// Whether the cryptographic validity window has passed
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Signs and verifies bearer tokens
#[derive(Clone)]
pub struct TokenIssuer {
    secret: [u8; 32],
    ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            secret: config.token_secret,
            ttl_secs: config.token_ttl.as_secs() as i64,
        }
    }

    /// Issue a signed token embedding the given identity
    pub fn issue(
        &self,
        account_id: Uuid,
        email: &str,
        role: AccountRole,
    ) -> IdentityResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            account_id,
            email: email.to_string(),
            role,
            iat: now,
            exp: now + self.ttl_secs,
        };

        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims)
                .map_err(|e| IdentityError::Internal(format!("Claims encoding failed: {e}")))?,
        );

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a token's signature and expiry, returning its claims
    ///
    /// Any malformation, bad signature, or elapsed validity window maps to
    /// `TokenInvalid`; callers never learn which.
    pub fn verify(&self, token: &str) -> IdentityResult<Claims> {
        let (payload, signature_b64) = token
            .split_once('.')
            .ok_or(IdentityError::TokenInvalid)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| IdentityError::TokenInvalid)?;

        mac.verify_slice(&signature)
            .map_err(|_| IdentityError::TokenInvalid)?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| IdentityError::TokenInvalid)?;

        let claims: Claims =
            serde_json::from_slice(&claims_bytes).map_err(|_| IdentityError::TokenInvalid)?;

        if claims.is_expired() {
            return Err(IdentityError::TokenInvalid);
        }

        Ok(claims)
    }
}
