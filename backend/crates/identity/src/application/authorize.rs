//! Auth Gateway
//!
//! Reconciles the stateless token check against the server-side session
//! registry. The evaluation order is fixed and each rejection stays
//! distinguishable:
//!
//! 1. no token on the request
//! 2. signature invalid or token cryptographically expired
//! 3. no session row backs the token (logged out or force-revoked)
//! 4. session row exists but its own expiry has passed
//!
//! A request passes only when both the cryptographic and the server-side
//! check succeed.

use std::sync::Arc;

use kernel::id::{AccountId, SessionId};

use crate::application::config::IdentityConfig;
use crate::application::token::TokenIssuer;
use crate::domain::repository::SessionRepository;
use crate::domain::value_object::AccountRole;
use crate::error::{IdentityError, IdentityResult};

/// Identity attached to a request that passed the gateway
#[derive(Debug, Clone)]
pub struct AuthorizedIdentity {
    pub account_id: AccountId,
    pub email: String,
    pub role: AccountRole,
    pub session_id: SessionId,
}

/// Gateway use case
pub struct AuthorizeRequestUseCase<S>
where
    S: SessionRepository,
{
    sessions: Arc<S>,
    issuer: TokenIssuer,
}

impl<S> AuthorizeRequestUseCase<S>
where
    S: SessionRepository + Send + Sync + 'static,
{
    pub fn new(sessions: Arc<S>, config: Arc<IdentityConfig>) -> Self {
        Self {
            sessions,
            issuer: TokenIssuer::new(&config),
        }
    }

    /// Evaluate a request's bearer token against both validity layers
    pub async fn execute(&self, token: Option<&str>) -> IdentityResult<AuthorizedIdentity> {
        let token = token.ok_or(IdentityError::MissingToken)?;

        let claims = self.issuer.verify(token)?;

        let session = match self.sessions.find_by_token(token).await {
            Ok(Some(session)) => session,
            Ok(None) => return Err(IdentityError::SessionRevoked),
            Err(e) => {
                // A store failure cannot prove the session live; reject
                // rather than let an unverifiable token through
                tracing::error!(error = %e, "Session lookup failed during authorization");
                return Err(IdentityError::SessionRevoked);
            }
        };

        // A token presented against someone else's session row is a forgery
        // indicator; treat it like a missing session
        if session.account_id.into_uuid() != claims.account_id {
            tracing::warn!(
                session_id = %session.session_id,
                "Token claims do not match the backing session"
            );
            return Err(IdentityError::SessionRevoked);
        }

        if session.is_expired() {
            return Err(IdentityError::SessionExpired);
        }

        // Activity stamping is off the request path
        let sessions = Arc::clone(&self.sessions);
        let mut touched = session.clone();
        tokio::spawn(async move {
            touched.touch();
            if let Err(e) = sessions.update_activity(&touched).await {
                tracing::debug!(error = %e, "Session activity update failed");
            }
        });

        Ok(AuthorizedIdentity {
            account_id: claims.account_id.into(),
            email: claims.email,
            role: claims.role,
            session_id: session.session_id,
        })
    }
}
